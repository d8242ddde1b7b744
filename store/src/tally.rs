//! Consistent snapshots and versioned tally commits.

use crate::{OrganizationStore, ProposalStore, StoreError, VoteStore};
use doctrine_types::{OrganizationRecords, Proposal, ProposalId, VoteRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Versions of the data a tally was computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotVersion {
    /// Bumped by every organisation write.
    pub organization: u64,
    /// Bumped by every vote written for this proposal.
    pub ballots: u64,
    /// Bumped by every successful `commit_tally` of this proposal.
    pub proposal: u64,
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "org@{}/ballots@{}/proposal@{}",
            self.organization, self.ballots, self.proposal
        )
    }
}

/// Everything needed to tabulate one proposal, read atomically.
#[derive(Clone, Debug, PartialEq)]
pub struct TallySnapshot {
    pub proposal: Proposal,
    pub organization: OrganizationRecords,
    pub votes: Vec<VoteRecord>,
    pub version: SnapshotVersion,
}

pub trait TallyStore: OrganizationStore + ProposalStore + VoteStore {
    /// Read the proposal, organisation and votes under one version.
    fn snapshot(&self, proposal: ProposalId) -> Result<TallySnapshot, StoreError>;

    /// Replace the stored proposal (status, cached tallies, outcome) if the
    /// organisation, this proposal's ballots and the proposal record itself
    /// are still at `expected`. Otherwise fails with [`StoreError::Conflict`]
    /// and writes nothing. A proposal already in a terminal status is never
    /// replaced: that fails with [`StoreError::Closed`].
    fn commit_tally(&self, expected: SnapshotVersion, proposal: &Proposal) -> Result<(), StoreError>;
}
