//! Output generation
//!
//! - Summary (report-wide JSON with per-account counts)
//! - One-line text summaries for logs

mod summary;

pub use summary::{build_summary, format_summary};
