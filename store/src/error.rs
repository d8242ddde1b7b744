use doctrine_types::{ProposalId, ProposalStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The data changed after the snapshot the write was based on.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// The proposal no longer accepts the write.
    #[error("proposal {proposal} is {status}")]
    Closed {
        proposal: ProposalId,
        status: ProposalStatus,
    },
}
