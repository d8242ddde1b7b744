use doctrine_organization::OrganizationError;
use doctrine_types::{DoctrineError, MemberId, ProposalId, ProposalStatus, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("member {0} cannot delegate to itself")]
    SelfDelegation(MemberId),

    #[error("member {0} has no team and may not vote directly")]
    NoTeam(MemberId),

    #[error("proposal {proposal} is {status}, not accepting votes")]
    ProposalClosed {
        proposal: ProposalId,
        status: ProposalStatus,
    },

    #[error("voting window of proposal {proposal} closed at {closes_at}")]
    VotingClosed {
        proposal: ProposalId,
        closes_at: Timestamp,
    },

    #[error("vote of {member} cannot change before {retry_at}")]
    VoteChangeTooSoon {
        member: MemberId,
        retry_at: Timestamp,
    },

    #[error("ballot for proposal {got} does not belong to proposal {expected}")]
    WrongProposal {
        expected: ProposalId,
        got: ProposalId,
    },

    #[error(transparent)]
    Organization(#[from] OrganizationError),

    #[error(transparent)]
    Doctrine(#[from] DoctrineError),

    #[error("{0}")]
    Other(String),
}
