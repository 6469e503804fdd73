//! Finding source interface
//!
//! The source returns one page per call plus an opaque token for the next
//! page. Filters are passed through untouched.

use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::finding::Finding;

/// Opaque finding filter (record state, workflow status, prefix/negation predicates)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingFilter(pub serde_json::Value);

impl FindingFilter {
    /// Filter that matches everything
    pub fn any() -> Self {
        Self(serde_json::Value::Null)
    }
}

/// One page returned by the finding source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindingPage {
    pub findings: Vec<Finding>,
    /// Token for the next page; `None` once the source is exhausted
    pub next_token: Option<String>,
}

/// External paginated provider of findings
pub trait FindingSource: Send + Sync {
    fn fetch_page(
        &self,
        filter: &FindingFilter,
        token: Option<&str>,
        max_results: usize,
    ) -> Result<FindingPage, BoxError>;
}

/// In-memory source serving a fixed finding set page by page
///
/// The continuation token is the offset of the next page.
#[derive(Debug, Clone, Default)]
pub struct PagedFindingSource {
    findings: Vec<Finding>,
}

impl PagedFindingSource {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    /// The full, unpaginated finding set
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

impl FindingSource for PagedFindingSource {
    fn fetch_page(
        &self,
        _filter: &FindingFilter,
        token: Option<&str>,
        max_results: usize,
    ) -> Result<FindingPage, BoxError> {
        let offset = match token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|e| format!("invalid continuation token '{}': {}", token, e))?,
            None => 0,
        };
        if max_results == 0 {
            return Err("max_results must be at least 1".into());
        }

        let end = offset.saturating_add(max_results).min(self.findings.len());
        let findings = self
            .findings
            .get(offset..end)
            .ok_or_else(|| format!("continuation token {} is past the end", offset))?
            .to_vec();
        let next_token = (end < self.findings.len()).then(|| end.to_string());

        Ok(FindingPage {
            findings,
            next_token,
        })
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
