//! Abstract storage traits for the doctrine tally engine.
//!
//! Backends (a database adapter, or the in-memory store for testing) implement
//! these traits. The tally service depends only on the traits.

pub mod error;
pub mod organization;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use error::StoreError;
pub use organization::OrganizationStore;
pub use proposal::ProposalStore;
pub use tally::{SnapshotVersion, TallySnapshot, TallyStore};
pub use vote::VoteStore;
