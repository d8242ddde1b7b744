use crate::level::UnitRef;
use doctrine_types::MemberId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizationError {
    #[error("member {0} appears more than once")]
    DuplicateMember(MemberId),

    #[error("unit {0} appears more than once")]
    DuplicateUnit(UnitRef),

    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("hierarchy snapshot could not be decoded: {0}")]
    Snapshot(String),

    #[error("{0}")]
    Other(String),
}
