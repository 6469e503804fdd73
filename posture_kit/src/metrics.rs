//! Metric datums for the time-series sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, PostureError, PostureResult};

/// Namespace score metrics are published under by default
pub const DEFAULT_NAMESPACE: &str = "SecurityPosture";

/// Name of the score metric
pub const SCORE_METRIC: &str = "Score";

/// Unit of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Percent,
}

/// A single metric value with its dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDatum {
    pub namespace: String,
    pub metric_name: String,
    /// `(name, value)` pairs
    pub dimensions: Vec<(String, String)>,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    /// Score datum for one account of a report
    pub fn score(
        namespace: &str,
        report: &str,
        account_id: &str,
        score: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            metric_name: SCORE_METRIC.to_string(),
            dimensions: vec![
                ("Report".to_string(), report.to_string()),
                ("AccountId".to_string(), account_id.to_string()),
            ],
            value: score,
            unit: MetricUnit::Percent,
            timestamp,
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push((name.into(), value.into()));
        self
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// External time-series sink
pub trait MetricsPublisher: Send + Sync {
    fn publish(&self, datum: &MetricDatum) -> Result<(), BoxError>;
}

/// Publish datums in order, stopping at the first failure
pub fn publish_all(publisher: &dyn MetricsPublisher, datums: &[MetricDatum]) -> PostureResult<()> {
    for datum in datums {
        publisher
            .publish(datum)
            .map_err(|source| PostureError::MetricsPublisher {
                metric: datum.metric_name.clone(),
                source,
            })?;
        log::debug!(
            "Published {}/{} = {:.2}",
            datum.namespace,
            datum.metric_name,
            datum.value
        );
    }
    Ok(())
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
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        published: Mutex<Vec<MetricDatum>>,
        fail_after: Option<usize>,
    }

    impl MetricsPublisher for Recorder {
        fn publish(&self, datum: &MetricDatum) -> Result<(), BoxError> {
            let mut published = self.published.lock().unwrap();
            if Some(published.len()) == self.fail_after {
                return Err("InvalidParameterValue".into());
            }
            published.push(datum.clone());
            Ok(())
        }
    }

    #[test]
    fn test_score_datum_dimensions() {
        let at = Utc.timestamp_opt(1691920532, 0).unwrap();
        let datum = MetricDatum::score(DEFAULT_NAMESPACE, "fsbp", "111", 71.4, at);
        assert_eq!(datum.namespace, "SecurityPosture");
        assert_eq!(datum.metric_name, "Score");
        assert_eq!(datum.dimension("Report"), Some("fsbp"));
        assert_eq!(datum.dimension("AccountId"), Some("111"));
        assert_eq!(datum.unit, MetricUnit::Percent);
    }

    #[test]
    fn test_publish_all_stops_on_failure() {
        let at = Utc::now();
        let datums = vec![
            MetricDatum::score(DEFAULT_NAMESPACE, "fsbp", "111", 100.0, at),
            MetricDatum::score(DEFAULT_NAMESPACE, "fsbp", "222", 50.0, at),
            MetricDatum::score(DEFAULT_NAMESPACE, "fsbp", "333", 0.0, at),
        ];
        let recorder = Recorder {
            fail_after: Some(1),
            ..Recorder::default()
        };

        let err = publish_all(&recorder, &datums).unwrap_err();
        assert!(matches!(err, PostureError::MetricsPublisher { .. }));
        assert_eq!(recorder.published.lock().unwrap().len(), 1);
    }
}
