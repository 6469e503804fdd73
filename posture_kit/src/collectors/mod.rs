//! Finding collection
//!
//! - `finding_source` - Paginated finding source interface and in-memory source
//! - `controller` - Bounded collection loop driven by continuation state

pub mod controller;
pub mod finding_source;

pub use controller::{
    CollectionController, ContinuationState, DEFAULT_MAX_RESULTS, DEFAULT_PAGES_PER_INVOCATION,
};
pub use finding_source::{FindingFilter, FindingPage, FindingSource, PagedFindingSource};
