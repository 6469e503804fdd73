//! Catalog resolution step

use chrono::Utc;

use posture_kit::catalog::{self, CatalogRef, ControlCatalog, ControlCatalogSource, GroupingStrategy};
use posture_kit::storage::{self, BatchCategory, ObjectStore};
use posture_kit::{PostureError, PostureResult};

use crate::state::ReportState;

/// Where the expected controls of a report come from
pub enum CatalogOrigin<'a> {
    /// Enabled controls of a standards subscription
    Subscription {
        source: &'a dyn ControlCatalogSource,
        subscription: String,
    },
    /// Config rules deployed by a conformance pack
    ConformancePack {
        source: &'a dyn ControlCatalogSource,
        pack: String,
    },
    /// Rule names supplied with the report
    CustomRules(Vec<String>),
}

impl CatalogOrigin<'_> {
    /// How findings of this origin map onto controls
    ///
    /// Standards findings reference their control directly; config rule
    /// findings only carry the rule name in their title.
    pub fn grouping_strategy(&self) -> GroupingStrategy {
        match self {
            CatalogOrigin::Subscription { .. } => GroupingStrategy::ByControlReference,
            CatalogOrigin::ConformancePack { .. } | CatalogOrigin::CustomRules(_) => {
                GroupingStrategy::ByTitlePrefix
            }
        }
    }

    fn load(&self) -> PostureResult<ControlCatalog> {
        match self {
            CatalogOrigin::Subscription {
                source,
                subscription,
            } => catalog::load_subscription_catalog(*source, subscription),
            CatalogOrigin::ConformancePack { source, pack } => {
                log::info!("Loading conformance pack context: {}", pack);
                let rules = source
                    .list_expected_controls(pack)
                    .map_err(|source| PostureError::CatalogSource {
                        subscription: pack.clone(),
                        source,
                    })?;
                Ok(ControlCatalog::from_conformance_rules(
                    rules.iter().map(|rule| rule.name.as_str()),
                ))
            }
            CatalogOrigin::CustomRules(rules) => {
                Ok(ControlCatalog::from_custom_rules(rules.iter().cloned()))
            }
        }
    }
}

/// Load the expected controls, store them and reference them from the state
pub fn resolve_catalog(
    mut state: ReportState,
    origin: &CatalogOrigin<'_>,
    store: &dyn ObjectStore,
) -> PostureResult<ReportState> {
    let catalog = origin.load()?;
    let key = storage::batch_key(&state.report, &BatchCategory::Controls, Utc::now());
    let key = storage::write_json(store, &state.bucket, &key, &catalog)?;

    log::info!(
        "Resolved {} controls for '{}' -> {}",
        catalog.len(),
        state.report,
        key
    );

    state.controls = Some(CatalogRef::Stored(key));
    state.group_by = origin.grouping_strategy().as_str().to_string();
    state.timestamp = super::now_unix();
    Ok(state)
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
