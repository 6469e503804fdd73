//! Metrics publishing step

use chrono::{DateTime, Utc};

use posture_kit::metrics::{self, MetricDatum, MetricsPublisher};
use posture_kit::PostureResult;

use crate::config::PipelineConfig;
use crate::state::AccountScore;

/// Publish one score datum per account
///
/// Accounts with a workload context also get `Workload` and `Environment`
/// dimensions.
/// Stops at the first failed publish; the orchestrator retries the whole step.
pub fn publish_scores(
    report: &str,
    timestamp: DateTime<Utc>,
    scores: &[AccountScore],
    config: &PipelineConfig,
    publisher: &dyn MetricsPublisher,
) -> PostureResult<()> {
    let datums: Vec<MetricDatum> = scores
        .iter()
        .map(|score| {
            let datum = MetricDatum::score(
                &config.metrics_namespace,
                report,
                &score.account_id,
                score.score,
                timestamp,
            );
            match (&score.workload, &score.environment) {
                (Some(workload), Some(environment)) => datum
                    .with_dimension("Workload", workload.as_str())
                    .with_dimension("Environment", environment.as_str()),
                _ => datum,
            }
        })
        .collect();

    metrics::publish_all(publisher, &datums)?;
    log::info!("Published {} scores for '{}'", datums.len(), report);
    Ok(())
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
