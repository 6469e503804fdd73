//! Account split step

use posture_kit::aggregator::FindingAggregator;
use posture_kit::partitioner::AccountPartitioner;
use posture_kit::storage::ObjectStore;
use posture_kit::PostureResult;

use crate::state::{AccountsState, ReportState};

/// Merge every collected batch and store one batch per account
pub fn split(state: &ReportState, store: &dyn ObjectStore) -> PostureResult<AccountsState> {
    let aggregator = FindingAggregator::new(store, state.bucket.as_str());
    let findings = aggregator.merge(
        &state.aggregated_findings,
        &state.continuation.accumulated_batch_refs,
    )?;

    let partitioner =
        AccountPartitioner::new(store, state.bucket.as_str(), state.report.as_str());
    let accounts = partitioner.partition(
        findings,
        state.grouping_strategy(),
        state.controls.clone(),
    )?;

    Ok(AccountsState {
        report: state.report.clone(),
        bucket: state.bucket.clone(),
        timestamp: super::now_unix(),
        accounts,
    })
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
