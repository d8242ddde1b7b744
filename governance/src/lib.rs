//! Vote tabulation rules.
//!
//! Resolution walks from a member's direct vote through delegation chains to
//! leader fallbacks. Aggregation sums weighted effective votes unit by unit and
//! applies the unanimity multipliers. The outcome step redistributes
//! abstentions and compares yes votes against a share of total membership.
//!
//! Everything here is a pure function of a [`doctrine_organization::Hierarchy`]
//! snapshot and a proposal's [`Ballots`].

pub mod aggregator;
pub mod ballot;
pub mod breakdown;
pub mod delegation;
pub mod error;
pub mod outcome;
pub mod resolver;

pub use aggregator::{
    aggregate, AppliedMultiplier, Aggregation, Aggregator, Buckets, Tally, UnitTally,
};
pub use ballot::{prepare_vote, Ballots};
pub use breakdown::{breakdown, SourceCounts, VoteBreakdown};
pub use delegation::{DelegationChain, DelegationEngine};
pub use error::GovernanceError;
pub use outcome::{decide, meets_threshold, redistribute_abstain};
pub use resolver::{EffectiveVote, Resolver, VoteSource};
