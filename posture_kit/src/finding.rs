//! Finding model
//!
//! Findings are produced by the finding source and never mutated afterwards.
//! Field names on the wire follow the finding API (`GeneratorId`,
//! `AwsAccountId`, ...), so stored batches stay readable by other tooling.

use serde::{Deserialize, Serialize};

/// Compliance status reported on a finding
///
/// Any value the API may add later is kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComplianceStatus {
    Passed,
    Failed,
    Warning,
    NotAvailable,
    /// No status set
    #[default]
    Empty,
    Other(String),
}

impl ComplianceStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            ComplianceStatus::Passed => "PASSED",
            ComplianceStatus::Failed => "FAILED",
            ComplianceStatus::Warning => "WARNING",
            ComplianceStatus::NotAvailable => "NOT_AVAILABLE",
            ComplianceStatus::Empty => "",
            ComplianceStatus::Other(value) => value,
        }
    }

    /// Whether this status counts against a control
    ///
    /// Only `FAILED` and `WARNING` fail; everything else, unknown values
    /// included, passes.
    pub fn is_failing(&self) -> bool {
        matches!(self, ComplianceStatus::Failed | ComplianceStatus::Warning)
    }
}

impl From<String> for ComplianceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PASSED" => ComplianceStatus::Passed,
            "FAILED" => ComplianceStatus::Failed,
            "WARNING" => ComplianceStatus::Warning,
            "NOT_AVAILABLE" => ComplianceStatus::NotAvailable,
            "" => ComplianceStatus::Empty,
            _ => ComplianceStatus::Other(value),
        }
    }
}

impl From<&str> for ComplianceStatus {
    fn from(value: &str) -> Self {
        ComplianceStatus::from(value.to_string())
    }
}

impl From<ComplianceStatus> for String {
    fn from(status: ComplianceStatus) -> Self {
        match status {
            ComplianceStatus::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single compliance check result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(rename = "Status", default)]
    pub status: ComplianceStatus,

    #[serde(rename = "ProductArn", default)]
    pub product_arn: String,

    /// Control reference the finding was generated for
    #[serde(rename = "GeneratorId", default)]
    pub generator_id: String,

    #[serde(rename = "Title", default)]
    pub title: String,

    #[serde(rename = "AwsAccountId", default)]
    pub account_id: String,

    #[serde(
        rename = "AwsAccountName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub account_name: Option<String>,
}

impl Finding {
    /// Create a finding for an account and control reference
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        generator_id: impl Into<String>,
        status: impl Into<ComplianceStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            generator_id: generator_id.into(),
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
