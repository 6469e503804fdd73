//! Collection step

use posture_kit::collectors::{CollectionController, FindingSource};
use posture_kit::storage::ObjectStore;
use posture_kit::PostureResult;

use crate::config::PipelineConfig;
use crate::state::ReportState;

/// Run one bounded collection invocation
///
/// The orchestrator calls this again with the returned state until
/// [`ReportState::collection_done`] holds. On error the input state is
/// consumed but unchanged in the orchestrator's copy, so the invocation can
/// be retried as a whole.
pub fn collect(
    mut state: ReportState,
    config: &PipelineConfig,
    source: &dyn FindingSource,
    store: &dyn ObjectStore,
) -> PostureResult<ReportState> {
    // Aggregation empties the raw refs, so the controller alone cannot tell
    // a finished collection from a fresh one
    if state.collection_done() {
        log::warn!("Collection for '{}' is already done", state.report);
        return Ok(state);
    }

    log::info!("Running a report for: {}", state.report);
    log::info!("Use the '{}' bucket", state.bucket);

    let controller = CollectionController::new(state.report.as_str(), state.bucket.as_str())
        .with_filter(state.filter.clone())
        .with_max_results(config.max_results)
        .with_pages_per_invocation(config.pages_per_invocation);

    state.continuation = controller.step(Some(state.continuation), source, store)?;
    state.group_by = state.grouping_strategy().as_str().to_string();
    state.timestamp = super::now_unix();
    Ok(state)
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
