//! Unit activity evaluation.
//!
//! A squad, union or province stays active only while it has enough members
//! and enough active children. Teams are never switched off here. Deactivation cascades upward: a squad that
//! drops out reduces its union's counts before the union is checked.

use crate::level::UnitRef;
use doctrine_types::{GovernanceParams, OrganizationRecords, SquadId, TeamId, UnionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeactivationReason {
    TooFewMembers { have: usize, need: usize },
    TooFewChildren { have: usize, need: usize },
}

impl fmt::Display for DeactivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewMembers { have, need } => write!(f, "{have} members, need {need}"),
            Self::TooFewChildren { have, need } => {
                write!(f, "{have} active children, need {need}")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deactivation {
    pub unit: UnitRef,
    pub reason: DeactivationReason,
}

/// Units that should be switched off, smallest level first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub deactivated: Vec<Deactivation>,
}

impl ActivityReport {
    pub fn is_empty(&self) -> bool {
        self.deactivated.is_empty()
    }

    pub fn contains(&self, unit: UnitRef) -> bool {
        self.deactivated.iter().any(|d| d.unit == unit)
    }

    /// Clear the `active` flag on every reported unit.
    pub fn apply(&self, records: &mut OrganizationRecords) {
        let off: HashSet<UnitRef> = self.deactivated.iter().map(|d| d.unit).collect();
        for s in &mut records.squads {
            if off.contains(&UnitRef::Squad(s.id)) {
                s.active = false;
            }
        }
        for u in &mut records.unions {
            if off.contains(&UnitRef::Union(u.id)) {
                u.active = false;
            }
        }
        for p in &mut records.provinces {
            if off.contains(&UnitRef::Province(p.id)) {
                p.active = false;
            }
        }
    }
}

/// Check every currently active unit against the minima in `params`.
///
/// Units already marked inactive are left alone and never reactivated here.
pub fn evaluate_activity(
    records: &OrganizationRecords,
    params: &GovernanceParams,
) -> ActivityReport {
    let mut report = ActivityReport::default();

    let mut team_members: HashMap<TeamId, usize> = HashMap::new();
    for member in &records.members {
        if let Some(team) = member.team {
            *team_members.entry(team).or_default() += 1;
        }
    }

    // Teams are taken as-is; every active team counts toward its squad.
    let active_teams: HashMap<TeamId, usize> = records
        .teams
        .iter()
        .filter(|t| t.active)
        .map(|t| (t.id, team_members.get(&t.id).copied().unwrap_or(0)))
        .collect();

    // (members, active children) per parent, fed by the level below.
    let mut squad_totals: HashMap<SquadId, (usize, usize)> = HashMap::new();
    for team in records.teams.iter() {
        if let (Some(squad), Some(&n)) = (team.parent_squad, active_teams.get(&team.id)) {
            let entry = squad_totals.entry(squad).or_default();
            entry.0 += n;
            entry.1 += 1;
        }
    }

    let mut active_squads: HashMap<SquadId, usize> = HashMap::new();
    for squad in records.squads.iter().filter(|s| s.active) {
        let (members, children) = squad_totals.get(&squad.id).copied().unwrap_or_default();
        match check(
            members,
            children,
            params.squad_min_members as usize,
            params.min_active_children as usize,
        ) {
            Some(reason) => report.deactivated.push(Deactivation {
                unit: UnitRef::Squad(squad.id),
                reason,
            }),
            None => {
                active_squads.insert(squad.id, members);
            }
        }
    }

    let mut union_totals: HashMap<UnionId, (usize, usize)> = HashMap::new();
    for squad in records.squads.iter() {
        if let (Some(union), Some(&n)) = (squad.parent_union, active_squads.get(&squad.id)) {
            let entry = union_totals.entry(union).or_default();
            entry.0 += n;
            entry.1 += 1;
        }
    }

    let mut active_unions: HashMap<UnionId, usize> = HashMap::new();
    for union in records.unions.iter().filter(|u| u.active) {
        let (members, children) = union_totals.get(&union.id).copied().unwrap_or_default();
        match check(
            members,
            children,
            params.union_min_members as usize,
            params.min_active_children as usize,
        ) {
            Some(reason) => report.deactivated.push(Deactivation {
                unit: UnitRef::Union(union.id),
                reason,
            }),
            None => {
                active_unions.insert(union.id, members);
            }
        }
    }

    let mut province_totals = HashMap::new();
    for union in records.unions.iter() {
        if let (Some(province), Some(&n)) = (union.parent_province, active_unions.get(&union.id))
        {
            let entry: &mut (usize, usize) = province_totals.entry(province).or_default();
            entry.0 += n;
            entry.1 += 1;
        }
    }

    for province in records.provinces.iter().filter(|p| p.active) {
        let (members, children) = province_totals
            .get(&province.id)
            .copied()
            .unwrap_or_default();
        if let Some(reason) = check(
            members,
            children,
            params.province_min_members as usize,
            params.min_active_children as usize,
        ) {
            report.deactivated.push(Deactivation {
                unit: UnitRef::Province(province.id),
                reason,
            });
        }
    }

    for d in &report.deactivated {
        tracing::info!(unit = %d.unit, reason = %d.reason, "unit falls below activity minimum");
    }
    report
}

fn check(
    members: usize,
    children: usize,
    min_members: usize,
    min_children: usize,
) -> Option<DeactivationReason> {
    if members < min_members {
        Some(DeactivationReason::TooFewMembers {
            have: members,
            need: min_members,
        })
    } else if children < min_children {
        Some(DeactivationReason::TooFewChildren {
            have: children,
            need: min_children,
        })
    } else {
        None
    }
}
