//! Proposal storage trait.

use crate::StoreError;
use doctrine_types::{Proposal, ProposalId, ProposalStatus, Timestamp};

pub trait ProposalStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Proposal, StoreError>;

    /// Store a new proposal. Fails with `Duplicate` if the id is taken.
    fn insert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    fn iter_proposals(&self) -> Result<Vec<Proposal>, StoreError>;

    /// Active proposals whose voting window has elapsed at `now`.
    fn expired_active_proposals(&self, now: Timestamp) -> Result<Vec<ProposalId>, StoreError> {
        Ok(self
            .iter_proposals()?
            .into_iter()
            .filter(|p| p.status == ProposalStatus::Active && p.has_closed(now))
            .map(|p| p.id)
            .collect())
    }
}
