//! Top-level error type shared across crates.

use crate::{ProposalId, ProposalStatus};
use thiserror::Error;

/// Common error type for the doctrine engine.
#[derive(Debug, Error)]
pub enum DoctrineError {
    #[error("proposal {proposal} is already {status}")]
    TerminalProposal {
        proposal: ProposalId,
        status: ProposalStatus,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("invalid governance parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("{0}")]
    Other(String),
}
