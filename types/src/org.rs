//! Plain organisation records as supplied by the record-keeping system.
//!
//! These are flat rows with parent pointers. `doctrine-organization` indexes
//! them into a navigable hierarchy snapshot.

use crate::{MemberId, ProvinceId, SquadId, TeamId, UnionId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    /// Current team, if any.
    pub team: Option<TeamId>,
    /// Member this one has entrusted their vote to.
    pub delegate: Option<MemberId>,
}

impl MemberRecord {
    pub fn new(id: MemberId, team: Option<TeamId>) -> Self {
        Self {
            id,
            team,
            delegate: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub leader: Option<MemberId>,
    pub parent_squad: Option<SquadId>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadRecord {
    pub id: SquadId,
    pub leader: Option<MemberId>,
    pub parent_union: Option<UnionId>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionRecord {
    pub id: UnionId,
    pub leader: Option<MemberId>,
    pub parent_province: Option<ProvinceId>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceRecord {
    pub id: ProvinceId,
    pub leader: Option<MemberId>,
    pub active: bool,
}

/// Every organisation record at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecords {
    pub members: Vec<MemberRecord>,
    pub teams: Vec<TeamRecord>,
    pub squads: Vec<SquadRecord>,
    pub unions: Vec<UnionRecord>,
    pub provinces: Vec<ProvinceRecord>,
}

impl OrganizationRecords {
    pub fn member_mut(&mut self, id: MemberId) -> Option<&mut MemberRecord> {
        self.members.iter_mut().find(|m| m.id == id)
    }
}
