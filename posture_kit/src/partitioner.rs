//! Account partitioning
//!
//! Splits a merged finding set into one stored batch per account. Each
//! partition carries the grouping strategy and catalog reference the score
//! calculation for that account needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{CatalogRef, GroupingStrategy};
use crate::error::PostureResult;
use crate::finding::Finding;
use crate::storage::{self, BatchCategory, ObjectStore};

/// Findings of one account, stored as a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPartition {
    #[serde(rename = "AccountId")]
    pub account_id: String,

    #[serde(rename = "AccountName", default)]
    pub account_name: Option<String>,

    /// Key of the stored account batch
    #[serde(rename = "Key")]
    pub batch_ref: String,

    #[serde(rename = "GroupBy", default)]
    pub grouping_strategy: GroupingStrategy,

    #[serde(rename = "Controls", default, skip_serializing_if = "Option::is_none")]
    pub control_catalog: Option<CatalogRef>,
}

/// Writes per-account batches to one bucket
pub struct AccountPartitioner<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    report: String,
}

impl<'a> AccountPartitioner<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        bucket: impl Into<String>,
        report: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            report: report.into(),
        }
    }

    /// Group findings by account id and store each group
    ///
    /// Partitions are returned in account id order. A store failure stops
    /// processing at that account.
    pub fn partition(
        &self,
        findings: Vec<Finding>,
        grouping_strategy: GroupingStrategy,
        control_catalog: Option<CatalogRef>,
    ) -> PostureResult<Vec<AccountPartition>> {
        let mut per_account: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
        for finding in findings {
            per_account
                .entry(finding.account_id.clone())
                .or_default()
                .push(finding);
        }

        let mut partitions = Vec::with_capacity(per_account.len());
        for (account_id, account_findings) in per_account {
            if account_id.is_empty() {
                log::warn!(
                    "{} findings carry no account id, storing them under '{}'",
                    account_findings.len(),
                    storage::UNKNOWN_ACCOUNT_SEGMENT
                );
            }

            let key = storage::write_findings(
                self.store,
                &self.bucket,
                &self.report,
                &BatchCategory::Account(account_id.clone()),
                &account_findings,
            )?;

            let account_name = account_findings
                .iter()
                .filter_map(|f| f.account_name.as_deref())
                .find(|name| !name.is_empty())
                .map(str::to_string);

            log::debug!(
                "Partitioned {} findings for account {} -> {}",
                account_findings.len(),
                account_id,
                key
            );

            partitions.push(AccountPartition {
                account_id,
                account_name,
                batch_ref: key,
                grouping_strategy,
                control_catalog: control_catalog.clone(),
            });
        }

        log::info!("Split findings into {} account partitions", partitions.len());
        Ok(partitions)
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
