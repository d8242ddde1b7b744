use doctrine_types::ProposalId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("organisation error: {0}")]
    Organization(#[from] doctrine_organization::OrganizationError),

    #[error("governance error: {0}")]
    Governance(#[from] doctrine_governance::GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] doctrine_store::StoreError),

    #[error("proposal error: {0}")]
    Doctrine(#[from] doctrine_types::DoctrineError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("proposal {proposal} kept changing; gave up after {attempts} attempts")]
    RetriesExhausted {
        proposal: ProposalId,
        attempts: u32,
    },

    #[error("proposal {0} is closed but has no recorded outcome")]
    MissingOutcome(ProposalId),

    #[error("thread pool error: {0}")]
    ThreadPool(String),

    #[error("{0}")]
    Other(String),
}
