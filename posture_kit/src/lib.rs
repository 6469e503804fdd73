//! # Posture Kit
//!
//! Collection, aggregation and compliance scoring of security posture findings.
//!
//! ## Modules
//!
//! - `collectors` - Bounded, resumable collection from a paginated finding source
//! - `aggregator` - Merging of stored finding batches
//! - `partitioner` - Per-account split of a merged finding set
//! - `calculator` - Per-control verdicts and the compliance score
//! - `catalog` - Control catalogs and grouping strategies
//! - `storage` - Object store interface and batch key layout
//! - `directory` - Account names and workload context
//! - `metrics` - Metric datums and publishing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posture_kit::calculator::ComplianceCalculator;
//! use posture_kit::catalog::{ControlCatalog, GroupingStrategy};
//!
//! let mut calc = ComplianceCalculator::new(ControlCatalog::new(["control-1", "control-2"]));
//! calc.process_all(&findings, GroupingStrategy::ByTitlePrefix);
//! println!("Score: {:.0}%", calc.score());
//! ```

pub mod aggregator;
pub mod calculator;
pub mod catalog;
pub mod collectors;
pub mod directory;
pub mod error;
pub mod finding;
pub mod metrics;
pub mod partitioner;
pub mod storage;

pub use error::{BoxError, PostureError, PostureResult};
pub use finding::{ComplianceStatus, Finding};
