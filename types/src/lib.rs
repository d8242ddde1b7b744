//! Fundamental types for the doctrine tally engine.
//!
//! This crate defines the records shared across every other crate in the workspace:
//! identifiers, timestamps, vote choices, proposals, organisation records and the
//! governance parameters that drive tabulation.

pub mod error;
pub mod ids;
pub mod org;
pub mod params;
pub mod proposal;
pub mod time;
pub mod vote;

pub use error::DoctrineError;
pub use ids::{MemberId, ProposalId, ProvinceId, SquadId, TeamId, UnionId};
pub use org::{MemberRecord, OrganizationRecords, ProvinceRecord, SquadRecord, TeamRecord, UnionRecord};
pub use params::GovernanceParams;
pub use proposal::{ArticleTier, CachedTally, Outcome, Proposal, ProposalKind, ProposalStatus};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{VoteChoice, VoteRecord};
