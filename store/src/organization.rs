//! Organisation record storage trait.

use crate::StoreError;
use doctrine_types::{
    MemberId, MemberRecord, OrganizationRecords, ProvinceRecord, SquadRecord, TeamRecord,
    UnionRecord,
};

/// Members and organisational units.
///
/// Every write bumps the organisation version reported by
/// [`crate::TallyStore::snapshot`].
pub trait OrganizationStore {
    /// All records at one point in time.
    fn organization(&self) -> Result<OrganizationRecords, StoreError>;

    /// Replace every record at once.
    fn put_organization(&self, records: &OrganizationRecords) -> Result<(), StoreError>;

    fn get_member(&self, id: MemberId) -> Result<MemberRecord, StoreError>;

    /// Insert or replace a member.
    fn put_member(&self, member: &MemberRecord) -> Result<(), StoreError>;

    /// Set or clear a member's delegate. Fails with `NotFound` for an unknown member.
    fn set_delegate(&self, member: MemberId, delegate: Option<MemberId>) -> Result<(), StoreError>;

    fn put_team(&self, team: &TeamRecord) -> Result<(), StoreError>;
    fn put_squad(&self, squad: &SquadRecord) -> Result<(), StoreError>;
    fn put_union(&self, union: &UnionRecord) -> Result<(), StoreError>;
    fn put_province(&self, province: &ProvinceRecord) -> Result<(), StoreError>;

    fn member_count(&self) -> Result<u64, StoreError> {
        self.organization().map(|r| r.members.len() as u64)
    }
}
