//! Object store access
//!
//! Batches of findings, aggregated sets and catalogs are stored as JSON blobs.
//! Keys are hierarchical:
//!
//! ```text
//! <report>/<category>/<YYYY>/<MM>/<DD>/<uuid>.json
//! ```
//!
//! where the category is `raw`, `aggregated`, `controls` or an account id
//! (`unknown-account` when the findings carry none).

use chrono::{DateTime, Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{BoxError, PostureError, PostureResult};
use crate::finding::Finding;

/// External blob storage
pub trait ObjectStore: Send + Sync {
    /// Read the object stored under `key`
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError>;

    /// Store `data` under `key` and return the key written
    fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String, BoxError>;
}

/// Key segment used for findings that carry no account id
pub const UNKNOWN_ACCOUNT_SEGMENT: &str = "unknown-account";

/// Kind of batch a key is generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCategory {
    Raw,
    Aggregated,
    Controls,
    Account(String),
}

impl BatchCategory {
    pub fn as_str(&self) -> &str {
        match self {
            BatchCategory::Raw => "raw",
            BatchCategory::Aggregated => "aggregated",
            BatchCategory::Controls => "controls",
            BatchCategory::Account(account_id) if account_id.is_empty() => {
                UNKNOWN_ACCOUNT_SEGMENT
            }
            BatchCategory::Account(account_id) => account_id,
        }
    }
}

/// Generate a unique key for a new batch
pub fn batch_key(report: &str, category: &BatchCategory, at: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}/{:02}/{:02}/{}.json",
        report,
        category.as_str(),
        at.year(),
        at.month(),
        at.day(),
        uuid::Uuid::new_v4()
    )
}

/// Decode a JSON object from the store
pub fn read_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> PostureResult<T> {
    log::debug!("Downloading s3://{}/{}", bucket, key);
    let data = store
        .get(bucket, key)
        .map_err(|source| PostureError::ObjectStore {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

    serde_json::from_slice(&data).map_err(|source| PostureError::MalformedBatch {
        key: key.to_string(),
        source,
    })
}

/// Encode a value as JSON and store it
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    value: &T,
) -> PostureResult<String> {
    let data = serde_json::to_vec(value)?;
    log::debug!("Upload file to s3://{}/{} ({} bytes)", bucket, key, data.len());

    store
        .put(bucket, key, data)
        .map_err(|source| PostureError::ObjectStore {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })
}

/// Read a stored batch of findings
pub fn read_findings(store: &dyn ObjectStore, bucket: &str, key: &str) -> PostureResult<Vec<Finding>> {
    let findings: Vec<Finding> = read_json(store, bucket, key)?;
    log::debug!("Downloaded {} findings from {}", findings.len(), key);
    Ok(findings)
}

/// Store a batch of findings under a fresh key
pub fn write_findings(
    store: &dyn ObjectStore,
    bucket: &str,
    report: &str,
    category: &BatchCategory,
    findings: &[Finding],
) -> PostureResult<String> {
    let key = batch_key(report, category, Utc::now());
    write_json(store, bucket, &key, findings)
}

/// Object store held in memory
///
/// Used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys stored in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = match self.objects.lock() {
            Ok(objects) => objects
                .keys()
                .filter(|(b, _)| b == bucket)
                .map(|(_, key)| key.clone())
                .collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BoxError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| "object store lock poisoned")?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| format!("NoSuchKey: s3://{}/{}", bucket, key).into())
    }

    fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String, BoxError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| "object store lock poisoned")?;
        objects.insert((bucket.to_string(), key.to_string()), data);
        Ok(key.to_string())
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
