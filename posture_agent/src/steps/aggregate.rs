//! Aggregation step

use posture_kit::aggregator::FindingAggregator;
use posture_kit::storage::ObjectStore;
use posture_kit::PostureResult;

use crate::state::ReportState;

/// Fold the raw batches collected so far into one aggregated batch
///
/// Keeps the number of references carried in the state small while
/// collection is still running. The continuation token is left alone.
pub fn aggregate(mut state: ReportState, store: &dyn ObjectStore) -> PostureResult<ReportState> {
    let raw = &state.continuation.accumulated_batch_refs;
    if raw.is_empty() {
        log::debug!("No raw batches to aggregate for '{}'", state.report);
        return Ok(state);
    }

    let aggregator = FindingAggregator::new(store, state.bucket.as_str());
    let key = aggregator.merge_and_store(&state.report, &[], raw)?;

    state.aggregated_findings.push(key);
    state.continuation.accumulated_batch_refs.clear();
    state.continuation.running_count = 0;
    state.timestamp = super::now_unix();
    Ok(state)
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
