//! State passed between pipeline steps
//!
//! The orchestrator stores these values as JSON between invocations, so
//! every field uses the orchestrator's PascalCase names and tolerates being
//! absent.

use serde::{Deserialize, Serialize};

use posture_kit::calculator::ScoreResult;
use posture_kit::catalog::{CatalogRef, GroupingStrategy};
use posture_kit::collectors::{ContinuationState, FindingFilter};
use posture_kit::directory::WorkloadContext;
use posture_kit::partitioner::AccountPartition;

/// Report-wide state from catalog resolution through account split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReportState {
    pub report: String,
    pub bucket: String,

    /// Unix seconds of the last step that touched this state
    pub timestamp: i64,

    pub filter: FindingFilter,

    /// Raw grouping value; see [`ReportState::grouping_strategy`]
    pub group_by: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls: Option<CatalogRef>,

    #[serde(flatten)]
    pub continuation: ContinuationState,

    /// Keys of batches already merged by the aggregation step
    pub aggregated_findings: Vec<String>,
}

impl ReportState {
    pub fn new(report: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Grouping strategy, falling back to control references
    pub fn grouping_strategy(&self) -> GroupingStrategy {
        GroupingStrategy::resolve_lenient(&self.group_by)
    }

    /// Whether the finding source has no more pages
    pub fn collection_done(&self) -> bool {
        self.continuation.token.is_none()
            && (!self.continuation.accumulated_batch_refs.is_empty()
                || !self.aggregated_findings.is_empty())
    }
}

/// Per-account state after the split step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccountsState {
    pub report: String,
    pub bucket: String,
    pub timestamp: i64,
    pub accounts: Vec<AccountPartition>,
}

/// Score of one account, the output of the calculation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountScore {
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub workload: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    pub score: f64,
    pub control_count: usize,
    pub finding_count: usize,
    pub control_failed_count: usize,
    pub control_passed_count: i64,
}

impl AccountScore {
    pub fn new(partition: &AccountPartition, result: &ScoreResult) -> Self {
        Self {
            account_id: partition.account_id.clone(),
            account_name: partition.account_name.clone(),
            workload: None,
            environment: None,
            score: result.score_percent,
            control_count: result.total_controls,
            finding_count: result.findings_processed,
            control_failed_count: result.failed_controls,
            control_passed_count: result.passed_controls,
        }
    }

    pub fn with_context(mut self, context: WorkloadContext) -> Self {
        self.workload = Some(context.workload);
        self.environment = Some(context.environment);
        self
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
