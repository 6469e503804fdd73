//! Collection controller
//!
//! Drives the finding source across bounded invocations. Each call fetches at
//! most `pages_per_invocation` pages, stores every page as a `raw` batch and
//! returns the continuation state the orchestrator passes to the next call.
//! The controller keeps nothing between calls.

use serde::{Deserialize, Deserializer, Serialize};

use crate::collectors::finding_source::{FindingFilter, FindingSource};
use crate::error::{PostureError, PostureResult};
use crate::storage::{self, BatchCategory, ObjectStore};

/// Default number of results requested per page
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default page cap per invocation, sized for an external execution-time budget
pub const DEFAULT_PAGES_PER_INVOCATION: usize = 3;

/// Cursor threaded between controller invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationState {
    /// Token for the next page; absent once the source is exhausted
    #[serde(
        rename = "NextToken",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub token: Option<String>,

    /// Keys of the stored raw batches, in fetch order
    #[serde(rename = "Findings", default)]
    pub accumulated_batch_refs: Vec<String>,

    /// Number of entries in `accumulated_batch_refs`
    #[serde(rename = "FindingCount", default)]
    pub running_count: usize,
}

impl ContinuationState {
    /// Whether the source reported its last page
    ///
    /// A state that has never fetched anything is not exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.token.is_none() && !self.accumulated_batch_refs.is_empty()
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let token: Option<String> = Option::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()))
}

/// Bounded, stateless driver of the finding source
#[derive(Debug, Clone)]
pub struct CollectionController {
    report: String,
    bucket: String,
    filter: FindingFilter,
    max_results: usize,
    pages_per_invocation: usize,
}

impl CollectionController {
    pub fn new(report: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            bucket: bucket.into(),
            filter: FindingFilter::any(),
            max_results: DEFAULT_MAX_RESULTS,
            pages_per_invocation: DEFAULT_PAGES_PER_INVOCATION,
        }
    }

    pub fn with_filter(mut self, filter: FindingFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_pages_per_invocation(mut self, pages: usize) -> Self {
        self.pages_per_invocation = pages.max(1);
        self
    }

    /// Run one bounded invocation
    ///
    /// `previous` is the state returned by the last invocation, or `None` to
    /// start collecting. On error the previous state is still valid for a
    /// retry; pages stored before the failure are not referenced.
    pub fn step(
        &self,
        previous: Option<ContinuationState>,
        source: &dyn FindingSource,
        store: &dyn ObjectStore,
    ) -> PostureResult<ContinuationState> {
        let mut state = previous.unwrap_or_default();

        if state.is_exhausted() {
            log::warn!(
                "Collection for '{}' already exhausted ({} batches), nothing to fetch",
                self.report,
                state.accumulated_batch_refs.len()
            );
            return Ok(state);
        }

        for page_number in 1..=self.pages_per_invocation {
            let page = source
                .fetch_page(&self.filter, state.token.as_deref(), self.max_results)
                .map_err(PostureError::FindingSource)?;

            let key = storage::write_findings(
                store,
                &self.bucket,
                &self.report,
                &BatchCategory::Raw,
                &page.findings,
            )?;

            log::info!(
                "Collected page {} of '{}': {} findings -> {}",
                page_number,
                self.report,
                page.findings.len(),
                key
            );

            state.accumulated_batch_refs.push(key);
            state.running_count = state.accumulated_batch_refs.len();
            state.token = page.next_token.filter(|t| !t.is_empty());

            if state.token.is_none() {
                log::info!(
                    "Finding source exhausted for '{}': {} batches pending aggregation",
                    self.report,
                    state.running_count
                );
                break;
            }
        }

        Ok(state)
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
    use crate::collectors::finding_source::{FindingPage, PagedFindingSource};
    use crate::error::BoxError;
    use crate::finding::Finding;
    use crate::storage::InMemoryObjectStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn findings(count: usize) -> Vec<Finding> {
        (0..count)
            .map(|i| {
                Finding::new(
                    format!("f-{}", i),
                    format!("acct-{}", i % 3),
                    format!("c-{}", i),
                    "PASSED",
                )
            })
            .collect()
    }

    #[test]
    fn test_loop_terminates_and_preserves_finding_set() {
        init_logging();
        let source = PagedFindingSource::new(findings(23));
        let store = InMemoryObjectStore::new();
        let controller = CollectionController::new("fsbp", "bucket")
            .with_max_results(2)
            .with_pages_per_invocation(3);

        let mut state = None;
        let mut invocations = 0;
        loop {
            let next = controller.step(state.take(), &source, &store).unwrap();
            invocations += 1;
            assert!(invocations < 100, "collection loop did not terminate");

            // The orchestrator stores the state as JSON between invocations
            let json = serde_json::to_string(&next).unwrap();
            let next: ContinuationState = serde_json::from_str(&json).unwrap();

            if next.is_exhausted() {
                state = Some(next);
                break;
            }
            state = Some(next);
        }

        let state = state.unwrap();
        // 12 pages of at most 2 findings, 3 pages per invocation
        assert_eq!(invocations, 4);
        assert_eq!(state.accumulated_batch_refs.len(), 12);
        assert_eq!(state.running_count, 12);

        let collected: Vec<Finding> = state
            .accumulated_batch_refs
            .iter()
            .flat_map(|key| storage::read_findings(&store, "bucket", key).unwrap())
            .collect();
        assert_eq!(collected, source.findings());
    }

    #[test]
    fn test_stops_at_page_cap() {
        let source = PagedFindingSource::new(findings(10));
        let store = InMemoryObjectStore::new();
        let controller = CollectionController::new("fsbp", "bucket")
            .with_max_results(1)
            .with_pages_per_invocation(3);

        let state = controller.step(None, &source, &store).unwrap();
        assert_eq!(state.accumulated_batch_refs.len(), 3);
        assert_eq!(state.token.as_deref(), Some("3"));
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_exhausted_state_is_returned_unchanged() {
        let source = PagedFindingSource::new(findings(2));
        let store = InMemoryObjectStore::new();
        let controller = CollectionController::new("fsbp", "bucket");

        let done = controller.step(None, &source, &store).unwrap();
        assert!(done.is_exhausted());
        let objects = store.len();

        let again = controller.step(Some(done.clone()), &source, &store).unwrap();
        assert_eq!(again, done);
        assert_eq!(store.len(), objects);
    }

    #[test]
    fn test_empty_token_deserializes_as_absent() {
        let state: ContinuationState =
            serde_json::from_str(r#"{"NextToken":"","Findings":[],"FindingCount":0}"#).unwrap();
        assert_eq!(state.token, None);
        assert!(!state.is_exhausted());

        let fresh: ContinuationState = serde_json::from_str("{}").unwrap();
        assert_eq!(fresh, ContinuationState::default());
    }

    /// Serves one page, then fails
    struct FailingSource {
        calls: AtomicUsize,
    }

    impl FindingSource for FailingSource {
        fn fetch_page(
            &self,
            _filter: &FindingFilter,
            _token: Option<&str>,
            _max_results: usize,
        ) -> Result<FindingPage, BoxError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(FindingPage {
                    findings: findings(1),
                    next_token: Some("next".into()),
                })
            } else {
                Err("ThrottlingException".into())
            }
        }
    }

    #[test]
    fn test_source_failure_aborts_without_returning_state() {
        let source = FailingSource {
            calls: AtomicUsize::new(0),
        };
        let store = InMemoryObjectStore::new();
        let controller = CollectionController::new("fsbp", "bucket");

        let previous = ContinuationState {
            token: Some("start".into()),
            accumulated_batch_refs: vec!["fsbp/raw/old.json".into()],
            running_count: 1,
        };
        let err = controller
            .step(Some(previous.clone()), &source, &store)
            .unwrap_err();
        assert!(matches!(err, PostureError::FindingSource(_)));
        assert_eq!(err.to_string(), "Finding source failed: ThrottlingException");

        // Retrying with the previous state resumes from its token
        let recorder = TokenRecorder::default();
        let state = controller
            .step(Some(previous), &recorder, &store)
            .unwrap();
        assert_eq!(
            recorder.tokens.lock().unwrap().first().cloned(),
            Some(Some("start".to_string()))
        );
        assert_eq!(state.accumulated_batch_refs[0], "fsbp/raw/old.json");
        assert_eq!(state.accumulated_batch_refs.len(), 2);
        assert_eq!(state.running_count, 2);
    }

    /// Records the tokens it is called with and ends after one page
    #[derive(Default)]
    struct TokenRecorder {
        tokens: Mutex<Vec<Option<String>>>,
    }

    impl FindingSource for TokenRecorder {
        fn fetch_page(
            &self,
            _filter: &FindingFilter,
            token: Option<&str>,
            _max_results: usize,
        ) -> Result<FindingPage, BoxError> {
            self.tokens.lock().unwrap().push(token.map(str::to_string));
            Ok(FindingPage {
                findings: findings(5),
                next_token: None,
            })
        }
    }

    #[test]
    fn test_finding_count_tracks_batch_references() {
        let store = InMemoryObjectStore::new();
        let controller = CollectionController::new("fsbp", "bucket");
        let previous: ContinuationState = serde_json::from_str(
            r#"{"NextToken":"2","Findings":["fsbp/raw/a.json","fsbp/raw/b.json"],"FindingCount":2}"#,
        )
        .unwrap();

        let state = controller
            .step(Some(previous), &TokenRecorder::default(), &store)
            .unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["Findings"].as_array().unwrap().len(), 3);
        assert_eq!(json["FindingCount"].as_u64(), Some(3));
    }

    /// Accepts a fixed number of writes, then fails
    struct QuotaStore {
        inner: InMemoryObjectStore,
        remaining: AtomicUsize,
    }

    impl ObjectStore for QuotaStore {
        fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError> {
            self.inner.get(bucket, key)
        }

        fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String, BoxError> {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return Err("SlowDown".into());
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            self.inner.put(bucket, key, data)
        }
    }

    #[test]
    fn test_store_failure_aborts_step() {
        let source = PagedFindingSource::new(findings(10));
        let store = QuotaStore {
            inner: InMemoryObjectStore::new(),
            remaining: AtomicUsize::new(1),
        };
        let controller = CollectionController::new("fsbp", "bucket")
            .with_max_results(2)
            .with_pages_per_invocation(3);

        let err = controller.step(None, &source, &store).unwrap_err();
        assert!(matches!(err, PostureError::ObjectStore { .. }));
        assert!(err.to_string().contains("SlowDown"));
        assert_eq!(store.inner.len(), 1);
    }
}
