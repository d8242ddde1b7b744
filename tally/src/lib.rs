//! Doctrine tally service.
//!
//! Ties the pure tabulation rules in `doctrine-governance` to a
//! [`doctrine_store::TallyStore`]: it takes consistent snapshots, aggregates
//! them, decides expired proposals and commits the outcome against the
//! snapshot version, retrying when votes or the organisation moved underneath.

pub mod config;
pub mod error;
pub mod metrics;
pub mod service;

pub use config::TallyConfig;
pub use error::TallyError;
pub use metrics::TallyMetrics;
pub use service::{SweepResult, TallyService};
