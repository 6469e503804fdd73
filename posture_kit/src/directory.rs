//! Account directory and workload context
//!
//! Account names follow the `<prefix>-<workload>-<environment>` convention,
//! which lets scores be reported per workload and environment as well as per
//! account.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BoxError, PostureError, PostureResult};

/// Environment assumed when the account name does not carry one
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// One page of accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPage {
    /// `(account id, account name)` pairs
    pub accounts: Vec<(String, String)>,
    pub next_token: Option<String>,
}

/// External paginated account listing
pub trait AccountDirectory: Send + Sync {
    fn list_accounts(&self, token: Option<&str>) -> Result<AccountPage, BoxError>;
}

/// Drain the directory into an id to name map
pub fn fetch_account_mapping(directory: &dyn AccountDirectory) -> PostureResult<HashMap<String, String>> {
    let mut mapping = HashMap::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = directory
            .list_accounts(token.as_deref())
            .map_err(PostureError::AccountDirectory)?;
        pages += 1;
        mapping.extend(page.accounts);

        match page.next_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    log::info!("Fetched {} account names in {} pages", mapping.len(), pages);
    Ok(mapping)
}

/// Workload and environment an account belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadContext {
    #[serde(rename = "Workload")]
    pub workload: String,
    #[serde(rename = "Environment")]
    pub environment: String,
}

impl WorkloadContext {
    /// Derive the context from an account name
    ///
    /// - `acme-shop-dev` → workload `shop`, environment `dev`
    /// - `acme-data-lake-test` → workload `data-lake`, environment `test`
    /// - `acme-shop` → workload `shop`, environment `production`
    pub fn from_account_name(name: &str) -> PostureResult<Self> {
        let parts: Vec<&str> = name.split('-').collect();

        match parts.as_slice() {
            [_, workload] => Ok(Self {
                workload: workload.to_string(),
                environment: DEFAULT_ENVIRONMENT.to_string(),
            }),
            [_, workload @ .., environment] if !workload.is_empty() => Ok(Self {
                workload: workload.join("-"),
                environment: environment.to_string(),
            }),
            _ => Err(PostureError::InvalidAccountName(name.to_string())),
        }
    }

    /// Derive the context, treating platform accounts as production
    ///
    /// Platform account names carry no environment suffix of their own.
    pub fn for_account(account_name: &str, platform_account: bool) -> PostureResult<Self> {
        if platform_account {
            let name = format!("{}-{}", account_name, DEFAULT_ENVIRONMENT);
            return Self::from_account_name(&name);
        }
        Self::from_account_name(account_name)
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_and_environment() {
        let ctx = WorkloadContext::from_account_name("acme-shop-dev").unwrap();
        assert_eq!(ctx.workload, "shop");
        assert_eq!(ctx.environment, "dev");

        let ctx = WorkloadContext::from_account_name("acme-data-lake-test").unwrap();
        assert_eq!(ctx.workload, "data-lake");
        assert_eq!(ctx.environment, "test");
    }

    #[test]
    fn test_two_part_name_defaults_to_production() {
        let ctx = WorkloadContext::from_account_name("acme-shop").unwrap();
        assert_eq!(ctx.workload, "shop");
        assert_eq!(ctx.environment, "production");
    }

    #[test]
    fn test_single_part_name_is_rejected() {
        let err = WorkloadContext::from_account_name("standalone").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not transform `standalone` to a workload and environment name"
        );
    }

    #[test]
    fn test_platform_account_override() {
        let ctx = WorkloadContext::for_account("acme-network", true).unwrap();
        assert_eq!(ctx.workload, "network");
        assert_eq!(ctx.environment, "production");

        // A platform name that looks like it has an environment keeps it in the workload
        let ctx = WorkloadContext::for_account("acme-network-dev", true).unwrap();
        assert_eq!(ctx.workload, "network-dev");
        assert_eq!(ctx.environment, "production");

        let ctx = WorkloadContext::for_account("acme-network", false).unwrap();
        assert_eq!(ctx.environment, "production");
        let ctx = WorkloadContext::for_account("acme-network-dev", false).unwrap();
        assert_eq!(ctx.environment, "dev");
    }

    struct TwoPages;

    impl AccountDirectory for TwoPages {
        fn list_accounts(&self, token: Option<&str>) -> Result<AccountPage, BoxError> {
            match token {
                None => Ok(AccountPage {
                    accounts: vec![("111".into(), "acme-shop-dev".into())],
                    next_token: Some("page-2".into()),
                }),
                Some("page-2") => Ok(AccountPage {
                    accounts: vec![("222".into(), "acme-shop-prod".into())],
                    next_token: None,
                }),
                Some(other) => Err(format!("unexpected token {}", other).into()),
            }
        }
    }

    #[test]
    fn test_fetch_account_mapping_drains_pages() {
        let mapping = fetch_account_mapping(&TwoPages).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("222").map(String::as_str), Some("acme-shop-prod"));
    }
}
