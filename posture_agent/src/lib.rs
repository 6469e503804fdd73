//! # Posture Agent
//!
//! Pipeline steps for security posture reports, driven by an external
//! orchestrator that stores the state between steps as JSON.
//!
//! ## Steps
//!
//! 1. `resolve_catalog` - Load and store the expected controls
//! 2. `collect` - Fetch finding pages, repeated until the source is exhausted
//! 3. `aggregate` - Fold raw batches into aggregated batches
//! 4. `split` - Store one batch per account
//! 5. `attach_account_names` / `workload_context` - Enrich accounts
//! 6. `calculate_score` - Score each account
//! 7. `publish_scores` - Send scores to the metrics sink
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posture_agent::config::PipelineConfig;
//! use posture_agent::state::ReportState;
//! use posture_agent::steps;
//!
//! let config = PipelineConfig::from_env()?;
//! let mut state = ReportState::new(&config.report, &config.bucket);
//! while !state.collection_done() {
//!     state = steps::collect(state, &config, &source, &store)?;
//! }
//! let accounts = steps::split(&state, &store)?;
//! for partition in &accounts.accounts {
//!     let score = steps::calculate_score(partition, None, &accounts.bucket, &store)?;
//!     println!("{}", posture_agent::output::format_summary(&score));
//! }
//! ```

pub mod config;
pub mod output;
pub mod state;
pub mod steps;
