//! Multiplier aggregation over the hierarchy.
//!
//! Members are visited once each, in four buckets: every union, every
//! standalone squad, every standalone team, then unaffiliated members. A unit
//! whose leaders agree unanimously has the total for the agreed choice
//! multiplied (union ×8, standalone squad ×4, standalone team ×2 by default).

use crate::ballot::Ballots;
use crate::resolver::Resolver;
use doctrine_organization::{Hierarchy, Squad, Team, Union, UnitRef};
use doctrine_types::{GovernanceParams, MemberId, VoteChoice};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Weighted vote totals per choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: u64,
    pub abstain: u64,
    pub veto: u64,
}

impl Tally {
    pub fn get(&self, choice: VoteChoice) -> u64 {
        match choice {
            VoteChoice::Yes => self.yes,
            VoteChoice::Abstain => self.abstain,
            VoteChoice::Veto => self.veto,
        }
    }

    fn slot(&mut self, choice: VoteChoice) -> &mut u64 {
        match choice {
            VoteChoice::Yes => &mut self.yes,
            VoteChoice::Abstain => &mut self.abstain,
            VoteChoice::Veto => &mut self.veto,
        }
    }

    pub fn add(&mut self, choice: VoteChoice, amount: u64) {
        let slot = self.slot(choice);
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> u64 {
        self.yes
            .saturating_add(self.abstain)
            .saturating_add(self.veto)
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        for choice in VoteChoice::ALL {
            self.add(choice, rhs.get(choice));
        }
    }
}

/// How many members were counted in each bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    pub unions: usize,
    pub standalone_squads: usize,
    pub standalone_teams: usize,
    pub unaffiliated: usize,
}

impl Buckets {
    pub fn total(&self) -> usize {
        self.unions + self.standalone_squads + self.standalone_teams + self.unaffiliated
    }
}

/// A multiplier that was applied to one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMultiplier {
    pub unit: UnitRef,
    pub choice: VoteChoice,
    pub factor: u64,
    /// Votes added by the multiplier on top of the raw total.
    pub bonus: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Weighted totals with multipliers applied.
    pub tally: Tally,
    /// Weighted totals without multipliers.
    pub unmultiplied: Tally,
    pub buckets: Buckets,
    pub multipliers: Vec<AppliedMultiplier>,
}

impl Aggregation {
    pub fn multiplier_bonus(&self) -> u64 {
        self.multipliers.iter().map(|m| m.bonus).sum()
    }
}

/// Totals for one processed unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitTally {
    pub raw: Tally,
    pub multiplied: Tally,
    pub members: usize,
    pub multiplier: Option<AppliedMultiplier>,
}

pub struct Aggregator<'a> {
    resolver: &'a Resolver<'a>,
    params: &'a GovernanceParams,
}

impl<'a> Aggregator<'a> {
    pub fn new(resolver: &'a Resolver<'a>, params: &'a GovernanceParams) -> Self {
        Self { resolver, params }
    }

    /// Run every bucket and sum the results.
    pub fn aggregate(&self) -> Aggregation {
        let h = self.resolver.hierarchy();
        let mut agg = Aggregation::default();

        for union in h.unions() {
            let unit = self.process_union(union);
            agg.buckets.unions += unit.members;
            absorb(&mut agg, unit);
        }
        for squad in h.standalone_squads() {
            let unit = self.process_squad(squad);
            agg.buckets.standalone_squads += unit.members;
            absorb(&mut agg, unit);
        }
        for team in h.standalone_teams() {
            let unit = self.process_team(team);
            agg.buckets.standalone_teams += unit.members;
            absorb(&mut agg, unit);
        }
        let loose = self.unaffiliated();
        agg.buckets.unaffiliated += loose.members;
        absorb(&mut agg, loose);

        tracing::debug!(
            yes = agg.tally.yes,
            abstain = agg.tally.abstain,
            veto = agg.tally.veto,
            members = agg.buckets.total(),
            multipliers = agg.multipliers.len(),
            "aggregation complete"
        );
        agg
    }

    /// All members of the union's squads; ×8 when the union leader and every
    /// squad leader voted directly and identically.
    pub fn process_union(&self, union: &Union) -> UnitTally {
        let h = self.resolver.hierarchy();
        let raw = self.sum(h.members_under_union(union.id));
        let squad_leaders = union.squads.iter().map(|&s| h.squad(s).and_then(|s| s.leader));
        let agreed = self.leaders_agree(union.leader, squad_leaders);
        self.finish(
            UnitRef::Union(union.id),
            raw,
            agreed,
            self.params.union_multiplier,
        )
    }

    /// All members of the squad's teams; ×4 when the squad leader and every
    /// team leader voted directly and identically.
    pub fn process_squad(&self, squad: &Squad) -> UnitTally {
        let h = self.resolver.hierarchy();
        let raw = self.sum(h.members_under_squad(squad.id));
        let team_leaders = squad.teams.iter().map(|&t| h.team(t).and_then(|t| t.leader));
        let agreed = self.leaders_agree(squad.leader, team_leaders);
        self.finish(
            UnitRef::Squad(squad.id),
            raw,
            agreed,
            self.params.squad_multiplier,
        )
    }

    /// A team outside any squad; ×2 when every member resolved to the same
    /// choice.
    pub fn process_team(&self, team: &Team) -> UnitTally {
        let mut raw = (Tally::default(), 0usize);
        let mut agreed: Option<VoteChoice> = None;
        let mut unanimous = !team.members.is_empty();
        for &member in &team.members {
            raw.1 += 1;
            match self.resolver.resolve(member) {
                Some(vote) => {
                    raw.0.add(vote.choice, u64::from(vote.weight));
                    match agreed {
                        None => agreed = Some(vote.choice),
                        Some(c) if c != vote.choice => unanimous = false,
                        Some(_) => {}
                    }
                }
                None => unanimous = false,
            }
        }
        let agreed = if unanimous { agreed } else { None };
        self.finish(
            UnitRef::Team(team.id),
            raw,
            agreed,
            self.params.team_multiplier,
        )
    }

    /// Members without a team, never multiplied.
    pub fn unaffiliated(&self) -> UnitTally {
        let h = self.resolver.hierarchy();
        let (raw, members) = self.sum(h.unaffiliated_members().map(|m| m.id));
        UnitTally {
            raw,
            multiplied: raw,
            members,
            multiplier: None,
        }
    }

    fn sum(&self, members: impl Iterator<Item = MemberId>) -> (Tally, usize) {
        let mut tally = Tally::default();
        let mut count = 0;
        for member in members {
            count += 1;
            if let Some(vote) = self.resolver.resolve(member) {
                tally.add(vote.choice, u64::from(vote.weight));
            }
        }
        (tally, count)
    }

    /// The choice shared by the unit leader and every sub-unit leader, using
    /// direct votes only. No sub-units or any missing leader means no
    /// agreement.
    fn leaders_agree(
        &self,
        leader: Option<MemberId>,
        sub_leaders: impl Iterator<Item = Option<MemberId>>,
    ) -> Option<VoteChoice> {
        let choice = self.resolver.direct(leader?)?;
        let mut seen = 0usize;
        for sub in sub_leaders {
            if self.resolver.direct(sub?)? != choice {
                return None;
            }
            seen += 1;
        }
        (seen > 0).then_some(choice)
    }

    fn finish(
        &self,
        unit: UnitRef,
        (raw, members): (Tally, usize),
        agreed: Option<VoteChoice>,
        factor: u64,
    ) -> UnitTally {
        let mut multiplied = raw;
        let multiplier = agreed.map(|choice| {
            let base = raw.get(choice);
            let boosted = base.saturating_mul(factor);
            *multiplied.slot(choice) = boosted;
            let applied = AppliedMultiplier {
                unit,
                choice,
                factor,
                bonus: boosted - base,
            };
            tracing::info!(%unit, %choice, factor, bonus = applied.bonus, "multiplier applied");
            applied
        });
        UnitTally {
            raw,
            multiplied,
            members,
            multiplier,
        }
    }
}

/// Resolve and aggregate one proposal's ballots over a hierarchy snapshot.
pub fn aggregate(hierarchy: &Hierarchy, ballots: &Ballots, params: &GovernanceParams) -> Aggregation {
    let resolver = Resolver::new(hierarchy, ballots);
    Aggregator::new(&resolver, params).aggregate()
}

fn absorb(agg: &mut Aggregation, unit: UnitTally) {
    agg.tally += unit.multiplied;
    agg.unmultiplied += unit.raw;
    if let Some(m) = unit.multiplier {
        agg.multipliers.push(m);
    }
}
