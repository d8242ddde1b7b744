//! Immutable hierarchy snapshot: arena storage plus id indices.
//!
//! Parent pointers go upward (member → team → squad → union → province) and a
//! precomputed children list on every unit gives the reverse enumerations, so
//! traversals never query the record store. Only active units are present;
//! see [`crate::HierarchyBuilder`] for how inactive units are folded away.

use crate::error::OrganizationError;
use crate::level::{Level, UnitRef};
use doctrine_types::{MemberId, ProvinceId, SquadId, TeamId, UnionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Current active team. `None` means the member is unaffiliated.
    pub team: Option<TeamId>,
    pub delegate: Option<MemberId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub leader: Option<MemberId>,
    /// Active parent squad. `None` makes the team standalone.
    pub squad: Option<SquadId>,
    pub members: Vec<MemberId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub id: SquadId,
    pub leader: Option<MemberId>,
    /// Active parent union. `None` makes the squad standalone.
    pub union: Option<UnionId>,
    pub teams: Vec<TeamId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub id: UnionId,
    pub leader: Option<MemberId>,
    pub province: Option<ProvinceId>,
    pub squads: Vec<SquadId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub leader: Option<MemberId>,
    pub unions: Vec<UnionId>,
}

/// An inconsistency found while building the snapshot.
///
/// None of these stop tabulation; the offending reference is dropped (or, for
/// leaders outside their unit, kept as-is) and reported here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    UnknownTeam { member: MemberId, team: TeamId },
    UnknownParent { unit: UnitRef, parent: UnitRef },
    UnknownLeader { unit: UnitRef, leader: MemberId },
    LeaderOutsideUnit { unit: UnitRef, leader: MemberId },
    UnknownDelegate { member: MemberId, delegate: MemberId },
    SelfDelegation { member: MemberId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTeam { member, team } => {
                write!(f, "{member} references unknown {team}")
            }
            Self::UnknownParent { unit, parent } => {
                write!(f, "{unit} references unknown parent {parent}")
            }
            Self::UnknownLeader { unit, leader } => {
                write!(f, "{unit} is led by unknown {leader}")
            }
            Self::LeaderOutsideUnit { unit, leader } => {
                write!(f, "{unit} is led by {leader}, who is not one of its members")
            }
            Self::UnknownDelegate { member, delegate } => {
                write!(f, "{member} delegates to unknown {delegate}")
            }
            Self::SelfDelegation { member } => write!(f, "{member} delegates to itself"),
        }
    }
}

/// Read-only snapshot of the organisation at one point in time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    pub(crate) members: Vec<Member>,
    pub(crate) member_index: HashMap<MemberId, usize>,
    pub(crate) teams: Vec<Team>,
    pub(crate) team_index: HashMap<TeamId, usize>,
    pub(crate) squads: Vec<Squad>,
    pub(crate) squad_index: HashMap<SquadId, usize>,
    pub(crate) unions: Vec<Union>,
    pub(crate) union_index: HashMap<UnionId, usize>,
    pub(crate) provinces: Vec<Province>,
    pub(crate) province_index: HashMap<ProvinceId, usize>,
    /// Leader weight for members above weight 1.
    pub(crate) weights: HashMap<MemberId, u32>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Hierarchy {
    // ── Arena access ─────────────────────────────────────────────────────

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.member_index.get(&id).map(|&i| &self.members[i])
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.team_index.get(&id).map(|&i| &self.teams[i])
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squad_index.get(&id).map(|&i| &self.squads[i])
    }

    pub fn union(&self, id: UnionId) -> Option<&Union> {
        self.union_index.get(&id).map(|&i| &self.unions[i])
    }

    pub fn province(&self, id: ProvinceId) -> Option<&Province> {
        self.province_index.get(&id).map(|&i| &self.provinces[i])
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn squads(&self) -> &[Squad] {
        &self.squads
    }

    pub fn unions(&self) -> &[Union] {
        &self.unions
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    /// Every known member, with or without a team.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // ── Upward lookups ───────────────────────────────────────────────────

    pub fn team_of(&self, member: MemberId) -> Option<&Team> {
        self.member(member)?.team.and_then(|t| self.team(t))
    }

    pub fn squad_of(&self, team: TeamId) -> Option<&Squad> {
        self.team(team)?.squad.and_then(|s| self.squad(s))
    }

    pub fn union_of(&self, squad: SquadId) -> Option<&Union> {
        self.squad(squad)?.union.and_then(|u| self.union(u))
    }

    pub fn province_of(&self, union: UnionId) -> Option<&Province> {
        self.union(union)?.province.and_then(|p| self.province(p))
    }

    pub fn delegate_of(&self, member: MemberId) -> Option<MemberId> {
        self.member(member)?.delegate
    }

    // ── Reverse enumerations ─────────────────────────────────────────────

    pub fn members_of(&self, team: TeamId) -> &[MemberId] {
        self.team(team).map(|t| t.members.as_slice()).unwrap_or(&[])
    }

    pub fn teams_of(&self, squad: SquadId) -> &[TeamId] {
        self.squad(squad).map(|s| s.teams.as_slice()).unwrap_or(&[])
    }

    pub fn squads_of(&self, union: UnionId) -> &[SquadId] {
        self.union(union).map(|u| u.squads.as_slice()).unwrap_or(&[])
    }

    pub fn unions_of(&self, province: ProvinceId) -> &[UnionId] {
        self.province(province)
            .map(|p| p.unions.as_slice())
            .unwrap_or(&[])
    }

    /// All members of all teams of a squad.
    pub fn members_under_squad(&self, squad: SquadId) -> impl Iterator<Item = MemberId> + '_ {
        self.teams_of(squad)
            .iter()
            .flat_map(move |&team| self.members_of(team).iter().copied())
    }

    /// All members of all teams of all squads of a union.
    pub fn members_under_union(&self, union: UnionId) -> impl Iterator<Item = MemberId> + '_ {
        self.squads_of(union)
            .iter()
            .flat_map(move |&squad| self.members_under_squad(squad))
    }

    /// Squads with no active parent union.
    pub fn standalone_squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.iter().filter(|s| s.union.is_none())
    }

    /// Teams with no active parent squad.
    pub fn standalone_teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().filter(|t| t.squad.is_none())
    }

    /// Members with no active team.
    pub fn unaffiliated_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.team.is_none())
    }

    // ── Leadership ───────────────────────────────────────────────────────

    pub fn leader(&self, unit: UnitRef) -> Option<MemberId> {
        match unit {
            UnitRef::Team(id) => self.team(id)?.leader,
            UnitRef::Squad(id) => self.squad(id)?.leader,
            UnitRef::Union(id) => self.union(id)?.leader,
            UnitRef::Province(id) => self.province(id)?.leader,
        }
    }

    /// The unit at `level` that contains `member`, following parent pointers.
    pub fn enclosing_unit(&self, member: MemberId, level: Level) -> Option<UnitRef> {
        let team = self.team_of(member)?;
        match level {
            Level::Team => Some(UnitRef::Team(team.id)),
            Level::Squad => team.squad.map(UnitRef::Squad),
            Level::Union => {
                let squad = self.squad_of(team.id)?;
                squad.union.map(UnitRef::Union)
            }
            Level::Province => {
                let squad = self.squad_of(team.id)?;
                let union = self.union_of(squad.id)?;
                union.province.map(UnitRef::Province)
            }
        }
    }

    /// Leader of the unit at `level` that contains `member`.
    pub fn enclosing_leader(&self, member: MemberId, level: Level) -> Option<MemberId> {
        self.leader(self.enclosing_unit(member, level)?)
    }

    /// Vote weight from the highest active unit this member leads.
    ///
    /// Province leader 4, union leader 3, squad leader 2, anyone else 1.
    pub fn leader_weight(&self, member: MemberId) -> u32 {
        self.weights.get(&member).copied().unwrap_or(1)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the snapshot for caching by the record-keeping layer.
    pub fn save_state(&self) -> Result<Vec<u8>, OrganizationError> {
        bincode::serialize(self).map_err(|e| OrganizationError::Snapshot(e.to_string()))
    }

    /// Restore a snapshot produced by [`Hierarchy::save_state`].
    pub fn load_state(data: &[u8]) -> Result<Self, OrganizationError> {
        bincode::deserialize(data).map_err(|e| OrganizationError::Snapshot(e.to_string()))
    }
}
