//! Organisational hierarchy for tabulation.
//!
//! Members belong to teams, teams to squads, squads to unions and unions to
//! provinces. This crate turns flat organisation records into an immutable,
//! indexed [`Hierarchy`] snapshot that the vote resolver and aggregator walk
//! without touching storage, and decides which units are active.

pub mod activity;
pub mod builder;
pub mod error;
pub mod hierarchy;
pub mod level;

pub use activity::{evaluate_activity, ActivityReport, Deactivation, DeactivationReason};
pub use builder::HierarchyBuilder;
pub use error::OrganizationError;
pub use hierarchy::{Diagnostic, Hierarchy, Member, Province, Squad, Team, Union};
pub use level::{Level, UnitRef};
