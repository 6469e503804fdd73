//! Error types
//!
//! Every collaborator failure is carried through unmodified as the `source`
//! of the matching variant. Nothing in this crate retries.

use thiserror::Error;

/// Boxed error returned by collaborator implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by pipeline operations
#[derive(Debug, Error)]
pub enum PostureError {
    /// Finding source call failed
    #[error("Finding source failed: {0}")]
    FindingSource(#[source] BoxError),

    /// Object store read or write failed
    #[error("Object store failed for s3://{bucket}/{key}: {source}")]
    ObjectStore {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    /// Stored batch does not decode to the expected shape
    #[error("Malformed batch {key}: {source}")]
    MalformedBatch {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded before storing
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Control catalog source call failed
    #[error("Control catalog source failed for {subscription}: {source}")]
    CatalogSource {
        subscription: String,
        #[source]
        source: BoxError,
    },

    /// Account directory call failed
    #[error("Account directory failed: {0}")]
    AccountDirectory(#[source] BoxError),

    /// Metrics publisher call failed
    #[error("Metrics publisher failed for {metric}: {source}")]
    MetricsPublisher {
        metric: String,
        #[source]
        source: BoxError,
    },

    /// Account name does not follow the `<prefix>-<workload>-<environment>` layout
    #[error("Could not transform `{0}` to a workload and environment name")]
    InvalidAccountName(String),
}

/// Result type for pipeline operations
pub type PostureResult<T> = Result<T, PostureError>;
