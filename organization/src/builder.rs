//! Builds a [`Hierarchy`] snapshot from flat organisation records.
//!
//! Inactive units are dropped: a team whose squad is inactive becomes
//! standalone, a squad whose union is inactive becomes standalone, and the
//! members of an inactive team become unaffiliated. That way every member
//! still lands in exactly one aggregation bucket.

use crate::error::OrganizationError;
use crate::hierarchy::{Diagnostic, Hierarchy, Member, Province, Squad, Team, Union};
use crate::level::UnitRef;
use doctrine_types::{
    MemberId, MemberRecord, OrganizationRecords, ProvinceId, ProvinceRecord, SquadId,
    SquadRecord, TeamId, TeamRecord, UnionId, UnionRecord,
};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Accumulates organisation records and turns them into a [`Hierarchy`].
#[derive(Clone, Debug, Default)]
pub struct HierarchyBuilder {
    records: OrganizationRecords,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: OrganizationRecords) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &OrganizationRecords {
        &self.records
    }

    pub fn into_records(self) -> OrganizationRecords {
        self.records
    }

    pub fn add_member(&mut self, id: MemberId, team: Option<TeamId>) -> &mut Self {
        self.records.members.push(MemberRecord::new(id, team));
        self
    }

    pub fn add_team(
        &mut self,
        id: TeamId,
        leader: Option<MemberId>,
        parent_squad: Option<SquadId>,
    ) -> &mut Self {
        self.records.teams.push(TeamRecord {
            id,
            leader,
            parent_squad,
            active: true,
        });
        self
    }

    pub fn add_squad(
        &mut self,
        id: SquadId,
        leader: Option<MemberId>,
        parent_union: Option<UnionId>,
    ) -> &mut Self {
        self.records.squads.push(SquadRecord {
            id,
            leader,
            parent_union,
            active: true,
        });
        self
    }

    pub fn add_union(
        &mut self,
        id: UnionId,
        leader: Option<MemberId>,
        parent_province: Option<ProvinceId>,
    ) -> &mut Self {
        self.records.unions.push(UnionRecord {
            id,
            leader,
            parent_province,
            active: true,
        });
        self
    }

    pub fn add_province(&mut self, id: ProvinceId, leader: Option<MemberId>) -> &mut Self {
        self.records.provinces.push(ProvinceRecord {
            id,
            leader,
            active: true,
        });
        self
    }

    /// Record that `from` entrusts their vote to `to`. Unknown `from` is ignored.
    pub fn set_delegate(&mut self, from: MemberId, to: MemberId) -> &mut Self {
        if let Some(member) = self.records.member_mut(from) {
            member.delegate = Some(to);
        }
        self
    }

    /// Mark a unit inactive.
    pub fn deactivate(&mut self, unit: UnitRef) -> &mut Self {
        match unit {
            UnitRef::Team(id) => self
                .records
                .teams
                .iter_mut()
                .filter(|t| t.id == id)
                .for_each(|t| t.active = false),
            UnitRef::Squad(id) => self
                .records
                .squads
                .iter_mut()
                .filter(|s| s.id == id)
                .for_each(|s| s.active = false),
            UnitRef::Union(id) => self
                .records
                .unions
                .iter_mut()
                .filter(|u| u.id == id)
                .for_each(|u| u.active = false),
            UnitRef::Province(id) => self
                .records
                .provinces
                .iter_mut()
                .filter(|p| p.id == id)
                .for_each(|p| p.active = false),
        }
        self
    }

    /// Index the records into a snapshot.
    ///
    /// Duplicate ids are the only hard error. Dangling references are dropped
    /// and reported through [`Hierarchy::diagnostics`].
    pub fn build(&self) -> Result<Hierarchy, OrganizationError> {
        let records = &self.records;
        ensure_unique(records.provinces.iter().map(|p| p.id), UnitRef::Province)?;
        ensure_unique(records.unions.iter().map(|u| u.id), UnitRef::Union)?;
        ensure_unique(records.squads.iter().map(|s| s.id), UnitRef::Squad)?;
        ensure_unique(records.teams.iter().map(|t| t.id), UnitRef::Team)?;
        let mut member_ids = HashSet::with_capacity(records.members.len());
        for member in &records.members {
            if !member_ids.insert(member.id) {
                return Err(OrganizationError::DuplicateMember(member.id));
            }
        }

        let mut h = Hierarchy::default();
        let mut diagnostics = Vec::new();

        for p in records.provinces.iter().filter(|p| p.active) {
            h.province_index.insert(p.id, h.provinces.len());
            h.provinces.push(Province {
                id: p.id,
                leader: None,
                unions: Vec::new(),
            });
        }

        let known: HashSet<ProvinceId> = records.provinces.iter().map(|p| p.id).collect();
        for u in records.unions.iter().filter(|u| u.active) {
            let province = u.parent_province.and_then(|pid| {
                resolve_parent(
                    &h.province_index,
                    &known,
                    pid,
                    UnitRef::Union(u.id),
                    UnitRef::Province(pid),
                    &mut diagnostics,
                )
            });
            if let Some(&i) = province.and_then(|pid| h.province_index.get(&pid)) {
                h.provinces[i].unions.push(u.id);
            }
            h.union_index.insert(u.id, h.unions.len());
            h.unions.push(Union {
                id: u.id,
                leader: None,
                province,
                squads: Vec::new(),
            });
        }

        let known: HashSet<UnionId> = records.unions.iter().map(|u| u.id).collect();
        for s in records.squads.iter().filter(|s| s.active) {
            let union = s.parent_union.and_then(|uid| {
                resolve_parent(
                    &h.union_index,
                    &known,
                    uid,
                    UnitRef::Squad(s.id),
                    UnitRef::Union(uid),
                    &mut diagnostics,
                )
            });
            if let Some(&i) = union.and_then(|uid| h.union_index.get(&uid)) {
                h.unions[i].squads.push(s.id);
            }
            h.squad_index.insert(s.id, h.squads.len());
            h.squads.push(Squad {
                id: s.id,
                leader: None,
                union,
                teams: Vec::new(),
            });
        }

        let known: HashSet<SquadId> = records.squads.iter().map(|s| s.id).collect();
        for t in records.teams.iter().filter(|t| t.active) {
            let squad = t.parent_squad.and_then(|sid| {
                resolve_parent(
                    &h.squad_index,
                    &known,
                    sid,
                    UnitRef::Team(t.id),
                    UnitRef::Squad(sid),
                    &mut diagnostics,
                )
            });
            if let Some(&i) = squad.and_then(|sid| h.squad_index.get(&sid)) {
                h.squads[i].teams.push(t.id);
            }
            h.team_index.insert(t.id, h.teams.len());
            h.teams.push(Team {
                id: t.id,
                leader: None,
                squad,
                members: Vec::new(),
            });
        }

        let known: HashSet<TeamId> = records.teams.iter().map(|t| t.id).collect();
        for m in &records.members {
            let team = match m.team {
                Some(tid) if h.team_index.contains_key(&tid) => Some(tid),
                Some(tid) if known.contains(&tid) => None,
                Some(tid) => {
                    diagnostics.push(Diagnostic::UnknownTeam {
                        member: m.id,
                        team: tid,
                    });
                    None
                }
                None => None,
            };
            if let Some(&i) = team.and_then(|tid| h.team_index.get(&tid)) {
                h.teams[i].members.push(m.id);
            }
            let delegate = match m.delegate {
                Some(d) if d == m.id => {
                    diagnostics.push(Diagnostic::SelfDelegation { member: m.id });
                    None
                }
                Some(d) if !member_ids.contains(&d) => {
                    diagnostics.push(Diagnostic::UnknownDelegate {
                        member: m.id,
                        delegate: d,
                    });
                    None
                }
                other => other,
            };
            h.member_index.insert(m.id, h.members.len());
            h.members.push(Member {
                id: m.id,
                team,
                delegate,
            });
        }

        // Leaders are checked once the structure is complete so that
        // containment can be tested against the final parent pointers.
        let claimed: Vec<(UnitRef, MemberId)> = records
            .provinces
            .iter()
            .filter(|p| p.active)
            .filter_map(|p| p.leader.map(|l| (UnitRef::Province(p.id), l)))
            .chain(
                records
                    .unions
                    .iter()
                    .filter(|u| u.active)
                    .filter_map(|u| u.leader.map(|l| (UnitRef::Union(u.id), l))),
            )
            .chain(
                records
                    .squads
                    .iter()
                    .filter(|s| s.active)
                    .filter_map(|s| s.leader.map(|l| (UnitRef::Squad(s.id), l))),
            )
            .chain(
                records
                    .teams
                    .iter()
                    .filter(|t| t.active)
                    .filter_map(|t| t.leader.map(|l| (UnitRef::Team(t.id), l))),
            )
            .collect();

        let mut accepted = Vec::with_capacity(claimed.len());
        for (unit, leader) in claimed {
            if h.member(leader).is_none() {
                diagnostics.push(Diagnostic::UnknownLeader { unit, leader });
                continue;
            }
            if h.enclosing_unit(leader, unit.level()) != Some(unit) {
                diagnostics.push(Diagnostic::LeaderOutsideUnit { unit, leader });
            }
            accepted.push((unit, leader));
        }

        for (unit, leader) in accepted {
            assign_leader(&mut h, unit, leader);
            let weight = unit.level().leader_weight();
            if weight > 1 {
                let entry = h.weights.entry(leader).or_insert(1);
                *entry = (*entry).max(weight);
            }
        }

        for diagnostic in &diagnostics {
            tracing::warn!(%diagnostic, "organisation record inconsistency");
        }
        h.diagnostics = diagnostics;

        tracing::debug!(
            members = h.members.len(),
            teams = h.teams.len(),
            squads = h.squads.len(),
            unions = h.unions.len(),
            provinces = h.provinces.len(),
            "hierarchy snapshot built"
        );
        Ok(h)
    }
}

fn ensure_unique<I>(ids: impl Iterator<Item = I>, wrap: fn(I) -> UnitRef) -> Result<(), OrganizationError>
where
    I: Copy + Eq + Hash,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(OrganizationError::DuplicateUnit(wrap(id)));
        }
    }
    Ok(())
}

/// Active parent → `Some`, inactive parent → `None`, unknown parent → `None`
/// plus a diagnostic.
fn resolve_parent<I>(
    active: &HashMap<I, usize>,
    known: &HashSet<I>,
    parent: I,
    unit: UnitRef,
    parent_ref: UnitRef,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<I>
where
    I: Copy + Eq + Hash,
{
    if active.contains_key(&parent) {
        Some(parent)
    } else {
        if !known.contains(&parent) {
            diagnostics.push(Diagnostic::UnknownParent {
                unit,
                parent: parent_ref,
            });
        }
        None
    }
}

fn assign_leader(h: &mut Hierarchy, unit: UnitRef, leader: MemberId) {
    match unit {
        UnitRef::Team(id) => {
            if let Some(&i) = h.team_index.get(&id) {
                h.teams[i].leader = Some(leader);
            }
        }
        UnitRef::Squad(id) => {
            if let Some(&i) = h.squad_index.get(&id) {
                h.squads[i].leader = Some(leader);
            }
        }
        UnitRef::Union(id) => {
            if let Some(&i) = h.union_index.get(&id) {
                h.unions[i].leader = Some(leader);
            }
        }
        UnitRef::Province(id) => {
            if let Some(&i) = h.province_index.get(&id) {
                h.provinces[i].leader = Some(leader);
            }
        }
    }
}
