//! Control catalogs and grouping strategies
//!
//! A catalog lists the controls a compliance framework expects to be
//! evaluated. An empty catalog means the control universe is unknown and is
//! inferred from the findings themselves.
//!
//! Catalogs come from three upstream origins, each normalized differently:
//!
//! - **Standards subscription**: enabled controls only, sorted and deduplicated
//! - **Conformance pack**: config rule names with the trailing `-<suffix>`
//!   stripped, sorted and deduplicated
//! - **Custom rules**: the supplied list, in order

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BoxError, PostureError, PostureResult};
use crate::storage::{self, ObjectStore};

/// How a finding resolves to a control identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingStrategy {
    /// Use the finding's control reference verbatim
    #[default]
    #[serde(rename = "GeneratorId")]
    ByControlReference,
    /// Match the finding title against catalog prefixes
    #[serde(rename = "Title")]
    ByTitlePrefix,
}

impl GroupingStrategy {
    /// Parse a wire value, falling back to `ByControlReference`
    ///
    /// Empty and unsupported values are logged and replaced rather than
    /// rejected, so a misconfigured report still produces scores.
    pub fn resolve_lenient(value: &str) -> Self {
        match value {
            "GeneratorId" => GroupingStrategy::ByControlReference,
            "Title" => GroupingStrategy::ByTitlePrefix,
            "" => {
                log::warn!("No GroupBy value supplied, falling back on 'GeneratorId'");
                GroupingStrategy::ByControlReference
            }
            other => {
                log::warn!(
                    "The GroupBy value '{}' is not supported, falling back on 'GeneratorId'",
                    other
                );
                GroupingStrategy::ByControlReference
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingStrategy::ByControlReference => "GeneratorId",
            GroupingStrategy::ByTitlePrefix => "Title",
        }
    }
}

impl std::fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered set of expected control names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ControlCatalog {
    controls: Vec<String>,
}

impl ControlCatalog {
    /// Catalog with an unknown control universe
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog keeping the first occurrence of each name
    pub fn new<I, S>(controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let controls = controls
            .into_iter()
            .map(Into::into)
            .filter(|control: &String| seen.insert(control.clone()))
            .collect();
        Self { controls }
    }

    /// Catalog from a custom rule list
    pub fn from_custom_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(rules)
    }

    /// Catalog from standards subscription controls, keeping enabled ones
    pub fn from_standards_controls<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut controls: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.name)
            .collect();
        controls.sort();
        controls.dedup();
        Self { controls }
    }

    /// Catalog from conformance pack config rule names
    ///
    /// Deployed rule names carry a generated suffix after the last `-`
    /// (`s3-bucket-logging-enabled-abc123`); the control is everything before it.
    pub fn from_conformance_rules<I, S>(rule_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut controls: Vec<String> = rule_names
            .into_iter()
            .map(|name| strip_rule_suffix(name.as_ref()).to_string())
            .collect();
        controls.sort();
        controls.dedup();
        Self { controls }
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(String::as_str)
    }

    /// First catalog entry that is a prefix of `title`
    pub fn match_title_prefix(&self, title: &str) -> Option<&str> {
        self.controls
            .iter()
            .find(|control| title.starts_with(control.as_str()))
            .map(String::as_str)
    }
}

impl From<Vec<String>> for ControlCatalog {
    fn from(controls: Vec<String>) -> Self {
        Self::new(controls)
    }
}

impl From<ControlCatalog> for Vec<String> {
    fn from(catalog: ControlCatalog) -> Self {
        catalog.controls
    }
}

fn strip_rule_suffix(rule_name: &str) -> &str {
    match rule_name.rfind('-') {
        Some(index) => rule_name.get(..index).unwrap_or(rule_name),
        None => "",
    }
}

/// A control as reported by a catalog source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub enabled: bool,
}

impl CatalogEntry {
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
        }
    }
}

/// External provider of expected controls
pub trait ControlCatalogSource: Send + Sync {
    /// List the controls of a framework or standards subscription
    fn list_expected_controls(&self, subscription: &str) -> Result<Vec<CatalogEntry>, BoxError>;
}

/// Load a standards subscription catalog through a catalog source
pub fn load_subscription_catalog(
    source: &dyn ControlCatalogSource,
    subscription: &str,
) -> PostureResult<ControlCatalog> {
    log::info!("Loading controls for subscription: {}", subscription);
    let entries = source
        .list_expected_controls(subscription)
        .map_err(|source| PostureError::CatalogSource {
            subscription: subscription.to_string(),
            source,
        })?;
    Ok(ControlCatalog::from_standards_controls(entries))
}

/// Reference to a control catalog carried between pipeline steps
///
/// Either the key of a stored catalog or the control names themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogRef {
    Stored(String),
    Inline(Vec<String>),
}

impl CatalogRef {
    /// Resolve the reference into a catalog
    pub fn resolve(&self, store: &dyn ObjectStore, bucket: &str) -> PostureResult<ControlCatalog> {
        match self {
            CatalogRef::Inline(controls) => Ok(ControlCatalog::new(controls.iter().cloned())),
            CatalogRef::Stored(key) => storage::read_json(store, bucket, key),
        }
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
    use crate::storage::InMemoryObjectStore;

    #[test]
    fn test_catalog_keeps_first_occurrence_order() {
        let catalog = ControlCatalog::new(["b", "a", "b", "c"]);
        let controls: Vec<&str> = catalog.iter().collect();
        assert_eq!(controls, vec!["b", "a", "c"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_match_title_prefix_takes_first_entry() {
        let catalog = ControlCatalog::new(["control-1", "control-10", "control-2"]);
        assert_eq!(catalog.match_title_prefix("control-10-abc"), Some("control-1"));
        assert_eq!(catalog.match_title_prefix("control-2-def"), Some("control-2"));
        assert_eq!(catalog.match_title_prefix("unrelated"), None);
    }

    #[test]
    fn test_conformance_rules_strip_suffix() {
        let catalog = ControlCatalog::from_conformance_rules([
            "s3-bucket-logging-enabled-abc123",
            "iam-root-access-key-check-def456",
            "s3-bucket-logging-enabled-zzz999",
        ]);
        let controls: Vec<&str> = catalog.iter().collect();
        assert_eq!(
            controls,
            vec!["iam-root-access-key-check", "s3-bucket-logging-enabled"]
        );
    }

    #[test]
    fn test_standards_controls_keep_enabled_sorted() {
        let catalog = ControlCatalog::from_standards_controls(vec![
            CatalogEntry::enabled("arn:control/S3.1"),
            CatalogEntry::disabled("arn:control/EC2.2"),
            CatalogEntry::enabled("arn:control/ACM.1"),
            CatalogEntry::enabled("arn:control/S3.1"),
        ]);
        let controls: Vec<&str> = catalog.iter().collect();
        assert_eq!(controls, vec!["arn:control/ACM.1", "arn:control/S3.1"]);
    }

    #[test]
    fn test_grouping_strategy_lenient() {
        assert_eq!(
            GroupingStrategy::resolve_lenient("Title"),
            GroupingStrategy::ByTitlePrefix
        );
        assert_eq!(
            GroupingStrategy::resolve_lenient(""),
            GroupingStrategy::ByControlReference
        );
        assert_eq!(
            GroupingStrategy::resolve_lenient("ProductArn"),
            GroupingStrategy::ByControlReference
        );
    }

    #[test]
    fn test_catalog_ref_untagged_forms() {
        let stored: CatalogRef = serde_json::from_str(r#""report/controls/x.json""#).unwrap();
        assert_eq!(stored, CatalogRef::Stored("report/controls/x.json".into()));

        let inline: CatalogRef = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(inline, CatalogRef::Inline(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_catalog_ref_resolves_stored_catalog() {
        let store = InMemoryObjectStore::new();
        let catalog = ControlCatalog::new(["control-1", "control-2"]);
        let key = storage::write_json(&store, "bucket", "report/controls/c.json", &catalog).unwrap();

        let resolved = CatalogRef::Stored(key).resolve(&store, "bucket").unwrap();
        assert_eq!(resolved, catalog);
    }

    struct StaticSource;

    impl ControlCatalogSource for StaticSource {
        fn list_expected_controls(&self, subscription: &str) -> Result<Vec<CatalogEntry>, BoxError> {
            if subscription == "missing" {
                return Err("subscription not found".into());
            }
            Ok(vec![
                CatalogEntry::enabled("S3.1"),
                CatalogEntry::disabled("S3.2"),
            ])
        }
    }

    #[test]
    fn test_load_subscription_catalog() {
        let catalog = load_subscription_catalog(&StaticSource, "sub-1").unwrap();
        assert_eq!(catalog.iter().collect::<Vec<_>>(), vec!["S3.1"]);

        let err = load_subscription_catalog(&StaticSource, "missing").unwrap_err();
        assert!(matches!(err, PostureError::CatalogSource { .. }));
    }
}
