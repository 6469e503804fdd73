//! Score calculation step

use posture_kit::calculator::ComplianceCalculator;
use posture_kit::catalog::ControlCatalog;
use posture_kit::directory::WorkloadContext;
use posture_kit::partitioner::AccountPartition;
use posture_kit::storage::{self, ObjectStore};
use posture_kit::PostureResult;

use crate::state::AccountScore;

/// Score one account partition
pub fn calculate_score(
    partition: &AccountPartition,
    context: Option<WorkloadContext>,
    bucket: &str,
    store: &dyn ObjectStore,
) -> PostureResult<AccountScore> {
    log::info!(
        "Calculating the security score for: {}",
        partition.account_id
    );

    let catalog = match &partition.control_catalog {
        Some(reference) => reference.resolve(store, bucket)?,
        None => ControlCatalog::empty(),
    };
    let findings = storage::read_findings(store, bucket, &partition.batch_ref)?;

    let mut calculator = ComplianceCalculator::new(catalog);
    calculator.process_all(&findings, partition.grouping_strategy);
    let result = calculator.result();

    log::info!(
        "{} passed and {} failed controls out of {} ({} findings)",
        result.passed_controls,
        result.failed_controls,
        result.total_controls,
        result.findings_processed
    );
    log::info!("Compliance score is: {:.2}%", result.score_percent);

    let score = AccountScore::new(partition, &result);
    Ok(match context {
        Some(context) => score.with_context(context),
        None => score,
    })
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
