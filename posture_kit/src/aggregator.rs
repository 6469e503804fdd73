//! Finding aggregation
//!
//! Merges stored batches into one finding set. Previously aggregated batches
//! come first, then raw batches, each in reference order. Duplicates are
//! passed through; the calculator's sticky-failure rules make repeated
//! findings harmless.

use crate::error::PostureResult;
use crate::finding::Finding;
use crate::storage::{self, BatchCategory, ObjectStore};

/// Merges referenced batches from one bucket
pub struct FindingAggregator<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
}

impl<'a> FindingAggregator<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Resolve and concatenate batches
    ///
    /// Fails on the first reference that cannot be read or decoded; no
    /// partial set is returned.
    pub fn merge(&self, aggregated: &[String], raw: &[String]) -> PostureResult<Vec<Finding>> {
        let mut merged = Vec::new();

        for key in aggregated.iter().chain(raw) {
            let batch = storage::read_findings(self.store, &self.bucket, key)?;
            merged.extend(batch);
        }

        log::info!(
            "Aggregated {} findings from {} aggregated and {} raw batches",
            merged.len(),
            aggregated.len(),
            raw.len()
        );
        Ok(merged)
    }

    /// Merge batches and store the result as a single `aggregated` batch
    ///
    /// Returns the key of the new batch.
    pub fn merge_and_store(
        &self,
        report: &str,
        aggregated: &[String],
        raw: &[String],
    ) -> PostureResult<String> {
        let merged = self.merge(aggregated, raw)?;
        storage::write_findings(
            self.store,
            &self.bucket,
            report,
            &BatchCategory::Aggregated,
            &merged,
        )
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
