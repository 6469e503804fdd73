//! Compliance calculator
//!
//! Reduces an unordered stream of findings to one verdict per control and an
//! overall score. Verdicts follow three rules:
//!
//! - The first finding for a control sets its verdict.
//! - A failing finding turns a passed control into a failed one, once.
//! - A failed control stays failed whatever arrives after it.
//!
//! The result does not depend on the order findings arrive in.
//!
//! ```text
//! NotProcessed ──pass──► Passed ──fail──► Failed
//!       │                                   ▲
//!       └───────────────fail────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{ControlCatalog, GroupingStrategy};
use crate::finding::Finding;

/// Verdict of a single control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlVerdict {
    NotProcessed,
    Passed,
    Failed,
}

impl ControlVerdict {
    /// Verdict carried by one finding
    pub fn of(finding: &Finding) -> Self {
        if finding.status.is_failing() {
            ControlVerdict::Failed
        } else {
            ControlVerdict::Passed
        }
    }
}

/// Counts and score of one calculator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Catalog size, or the number of distinct controls seen when the catalog is empty
    pub total_controls: usize,
    /// `total_controls - failed_controls`; negative when controls outside a
    /// non-empty catalog fail
    pub passed_controls: i64,
    pub failed_controls: usize,
    pub findings_processed: usize,
    /// Percentage of passing controls, not rounded
    pub score_percent: f64,
}

impl ScoreResult {
    /// Score truncated to a whole percentage
    pub fn score_truncated(&self) -> i64 {
        self.score_percent.trunc() as i64
    }

    pub fn is_compliant(&self) -> bool {
        self.failed_controls == 0
    }
}

/// Per-account reducer over findings
#[derive(Debug, Clone, Default)]
pub struct ComplianceCalculator {
    catalog: ControlCatalog,
    verdicts: HashMap<String, ControlVerdict>,
    first_seen: usize,
    passed: usize,
    failed: usize,
    findings: usize,
}

impl ComplianceCalculator {
    pub fn new(catalog: ControlCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Control identifier a finding counts towards
    pub fn resolve_identifier<'f>(
        &'f self,
        finding: &'f Finding,
        strategy: GroupingStrategy,
    ) -> &'f str {
        match strategy {
            GroupingStrategy::ByControlReference => &finding.generator_id,
            GroupingStrategy::ByTitlePrefix => self
                .catalog
                .match_title_prefix(&finding.title)
                .unwrap_or(&finding.title),
        }
    }

    /// Fold one finding into the verdicts
    pub fn process_finding(&mut self, finding: &Finding, strategy: GroupingStrategy) {
        self.findings += 1;
        let status = ControlVerdict::of(finding);
        let identifier = self.resolve_identifier(finding, strategy).to_string();

        match self.verdict(&identifier) {
            ControlVerdict::NotProcessed => {
                match status {
                    ControlVerdict::Failed => self.failed += 1,
                    _ => self.passed += 1,
                }
                self.first_seen += 1;
                self.verdicts.insert(identifier, status);
            }
            ControlVerdict::Passed if status == ControlVerdict::Failed => {
                self.passed = self.passed.saturating_sub(1);
                self.failed += 1;
                self.verdicts.insert(identifier, ControlVerdict::Failed);
            }
            // Failed is sticky, and pass after pass changes nothing
            ControlVerdict::Passed | ControlVerdict::Failed => {}
        }
    }

    /// Fold a sequence of findings
    pub fn process_all<'f, I>(&mut self, findings: I, strategy: GroupingStrategy)
    where
        I: IntoIterator<Item = &'f Finding>,
    {
        for finding in findings {
            self.process_finding(finding, strategy);
        }
    }

    /// Current verdict of a control
    pub fn verdict(&self, identifier: &str) -> ControlVerdict {
        self.verdicts
            .get(identifier)
            .copied()
            .unwrap_or(ControlVerdict::NotProcessed)
    }

    /// Number of distinct controls seen so far
    pub fn first_seen_controls(&self) -> usize {
        self.first_seen
    }

    pub fn findings_processed(&self) -> usize {
        self.findings
    }

    pub fn failed_controls(&self) -> usize {
        self.failed
    }

    /// Distinct controls seen with a passing verdict
    pub fn observed_passed_controls(&self) -> usize {
        self.passed
    }

    /// Score as a percentage
    ///
    /// Nothing processed scores 100 whatever the catalog holds.
    pub fn score(&self) -> f64 {
        if self.first_seen == 0 {
            return 100.0;
        }
        let total = self.effective_total();
        let passed = total as i64 - self.failed as i64;
        (passed as f64 / total as f64) * 100.0
    }

    /// Counts and score
    pub fn result(&self) -> ScoreResult {
        let total = self.effective_total();
        ScoreResult {
            total_controls: total,
            passed_controls: total as i64 - self.failed as i64,
            failed_controls: self.failed,
            findings_processed: self.findings,
            score_percent: self.score(),
        }
    }

    fn effective_total(&self) -> usize {
        if self.catalog.is_empty() {
            self.first_seen
        } else {
            self.catalog.len()
        }
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
