//! Configuration types for the pipeline steps
//!
//! Values come from the environment the steps run in, or from a TOML file for
//! local runs. Unset values take the defaults below.

use serde::Deserialize;

use posture_kit::collectors::{DEFAULT_MAX_RESULTS, DEFAULT_PAGES_PER_INVOCATION};
use posture_kit::metrics::DEFAULT_NAMESPACE;

/// Configuration shared by all pipeline steps
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Report name, used as the key prefix of every stored batch
    pub report: String,

    /// Bucket batches are stored in
    pub bucket: String,

    /// Findings requested per page
    pub max_results: usize,

    /// Pages fetched per collection invocation
    pub pages_per_invocation: usize,

    /// Accounts whose names carry no environment suffix
    pub platform_accounts: Vec<String>,

    /// Namespace score metrics are published under
    pub metrics_namespace: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            report: String::new(),
            bucket: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            pages_per_invocation: DEFAULT_PAGES_PER_INVOCATION,
            platform_accounts: Vec::new(),
            metrics_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from a variable lookup
    ///
    /// Recognized variables: `REPORT`, `BUCKET`, `MAX_RESULTS`,
    /// `PAGES_PER_INVOCATION`, `PLATFORM_ACCOUNTS` (comma separated) and
    /// `METRICS_NAMESPACE`. An unparsable `MAX_RESULTS` falls back to the
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(report) = lookup("REPORT") {
            config.report = report;
        }
        if let Some(bucket) = lookup("BUCKET") {
            config.bucket = bucket;
        }
        if let Some(value) = lookup("MAX_RESULTS") {
            match value.trim().parse::<usize>() {
                Ok(max_results) => config.max_results = max_results,
                Err(_) => log::warn!(
                    "MAX_RESULTS '{}' is not a number, using {}",
                    value,
                    DEFAULT_MAX_RESULTS
                ),
            }
        }
        if let Some(value) = lookup("PAGES_PER_INVOCATION") {
            config.pages_per_invocation =
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "PAGES_PER_INVOCATION".to_string(),
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = lookup("PLATFORM_ACCOUNTS") {
            config.platform_accounts = parse_account_list(&value);
        }
        if let Some(namespace) = lookup("METRICS_NAMESPACE") {
            config.metrics_namespace = namespace;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no step can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_results".to_string(),
                value: "0".to_string(),
            });
        }
        if self.pages_per_invocation == 0 {
            return Err(ConfigError::InvalidValue {
                name: "pages_per_invocation".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_platform_account(&self, account_id: &str) -> bool {
        self.platform_accounts.iter().any(|id| id == account_id)
    }
}

fn parse_account_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is present but unusable
    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },

    /// TOML text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
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
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_results, 100);
        assert_eq!(config.pages_per_invocation, 3);
        assert_eq!(config.metrics_namespace, "SecurityPosture");
        assert!(config.platform_accounts.is_empty());
    }

    #[test]
    fn test_environment_values() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("REPORT", "fsbp"),
            ("BUCKET", "posture-reports"),
            ("MAX_RESULTS", "50"),
            ("PLATFORM_ACCOUNTS", "111, 222,,333"),
        ]))
        .unwrap();
        assert_eq!(config.report, "fsbp");
        assert_eq!(config.bucket, "posture-reports");
        assert_eq!(config.max_results, 50);
        assert_eq!(config.platform_accounts, vec!["111", "222", "333"]);
        assert!(config.is_platform_account("222"));
        assert!(!config.is_platform_account("444"));
    }

    #[test]
    fn test_unparsable_max_results_falls_back() {
        let config = PipelineConfig::from_lookup(lookup(&[("MAX_RESULTS", "lots")])).unwrap();
        assert_eq!(config.max_results, 100);
    }

    #[test]
    fn test_zero_page_cap_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("PAGES_PER_INVOCATION", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = PipelineConfig::from_lookup(lookup(&[("PAGES_PER_INVOCATION", "x")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value 'x' for PAGES_PER_INVOCATION");
    }

    #[test]
    fn test_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            report = "cis"
            bucket = "reports"
            pages_per_invocation = 5
            platform_accounts = ["111"]
            "#,
        )
        .unwrap();
        assert_eq!(config.report, "cis");
        assert_eq!(config.pages_per_invocation, 5);
        assert_eq!(config.max_results, 100);

        let err = PipelineConfig::from_toml_str("unknown_key = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
