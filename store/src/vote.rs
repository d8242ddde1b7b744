//! Direct vote storage trait.

use crate::StoreError;
use doctrine_types::{MemberId, ProposalId, VoteRecord};

/// Direct votes, unique per `(proposal, member)`.
pub trait VoteStore {
    fn get_vote(&self, proposal: ProposalId, member: MemberId)
        -> Result<Option<VoteRecord>, StoreError>;

    /// Insert or replace the member's vote. Bumps the proposal's ballot version.
    ///
    /// Fails with [`StoreError::Closed`] once the proposal is terminal, checked
    /// atomically with the write.
    fn put_vote(&self, vote: &VoteRecord) -> Result<(), StoreError>;

    fn votes_for(&self, proposal: ProposalId) -> Result<Vec<VoteRecord>, StoreError>;
}
