//! Pipeline steps
//!
//! One function per step. Each takes the state produced by the previous step
//! plus the collaborators it needs, and returns the next state or an error.
//! Steps keep nothing between calls; the orchestrator owns the state.
//!
//! ```text
//! resolve_catalog → collect (repeat) → aggregate → split
//!     → attach_account_names → calculate_score (per account) → publish_scores
//! ```

mod accounts;
mod aggregate;
mod catalog;
mod collect;
mod publish;
mod score;
mod split;

pub use accounts::{attach_account_names, workload_context};
pub use aggregate::aggregate;
pub use catalog::{resolve_catalog, CatalogOrigin};
pub use collect::collect;
pub use publish::publish_scores;
pub use score::calculate_score;
pub use split::split;

/// Current time in unix seconds
fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
