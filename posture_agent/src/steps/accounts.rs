//! Account enrichment steps

use posture_kit::directory::{self, AccountDirectory, WorkloadContext};
use posture_kit::partitioner::AccountPartition;
use posture_kit::{PostureError, PostureResult};

use crate::config::PipelineConfig;
use crate::state::AccountsState;

/// Fill in account names the findings did not carry
pub fn attach_account_names(
    mut state: AccountsState,
    account_directory: &dyn AccountDirectory,
) -> PostureResult<AccountsState> {
    let mapping = directory::fetch_account_mapping(account_directory)?;

    for account in state
        .accounts
        .iter_mut()
        .filter(|account| account.account_name.is_none())
    {
        match mapping.get(&account.account_id) {
            Some(name) => account.account_name = Some(name.clone()),
            None => log::warn!("No account name found for {}", account.account_id),
        }
    }

    Ok(state)
}

/// Workload and environment of a partition's account
pub fn workload_context(
    partition: &AccountPartition,
    config: &PipelineConfig,
) -> PostureResult<WorkloadContext> {
    log::info!("Fetching workload context for: {}", partition.account_id);
    let name = partition
        .account_name
        .as_deref()
        .ok_or_else(|| PostureError::InvalidAccountName(partition.account_id.clone()))?;

    WorkloadContext::for_account(name, config.is_platform_account(&partition.account_id))
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
