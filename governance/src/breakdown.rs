//! Read-only breakdown of where a proposal's votes come from.

use crate::aggregator::{AppliedMultiplier, Aggregator, Tally};
use crate::ballot::Ballots;
use crate::resolver::{Resolver, VoteSource};
use doctrine_organization::Hierarchy;
use doctrine_types::GovernanceParams;
use serde::{Deserialize, Serialize};

/// Members counted per resolution source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub direct: usize,
    pub delegate: usize,
    pub team_leader: usize,
    pub squad_leader: usize,
    pub union_leader: usize,
    /// Members whose vote did not resolve.
    pub none: usize,
}

impl SourceCounts {
    fn record(&mut self, source: Option<VoteSource>) {
        let slot = match source {
            Some(VoteSource::Direct) => &mut self.direct,
            Some(VoteSource::Delegate) => &mut self.delegate,
            Some(VoteSource::TeamLeader) => &mut self.team_leader,
            Some(VoteSource::SquadLeader) => &mut self.squad_leader,
            Some(VoteSource::UnionLeader) => &mut self.union_leader,
            None => &mut self.none,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.direct
            + self.delegate
            + self.team_leader
            + self.squad_leader
            + self.union_leader
            + self.none
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBreakdown {
    pub sources: SourceCounts,
    pub unmultiplied: Tally,
    pub multiplied: Tally,
    /// Sum over choices of multiplied minus unmultiplied.
    pub multiplier_bonus: u64,
    pub multipliers: Vec<AppliedMultiplier>,
}

pub fn breakdown(hierarchy: &Hierarchy, ballots: &Ballots, params: &GovernanceParams) -> VoteBreakdown {
    let resolver = Resolver::new(hierarchy, ballots);
    let mut sources = SourceCounts::default();
    for member in hierarchy.members() {
        sources.record(resolver.resolve(member.id).map(|v| v.source));
    }
    let agg = Aggregator::new(&resolver, params).aggregate();
    VoteBreakdown {
        sources,
        unmultiplied: agg.unmultiplied,
        multiplied: agg.tally,
        multiplier_bonus: agg.multiplier_bonus(),
        multipliers: agg.multipliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrine_organization::HierarchyBuilder;
    use doctrine_types::{MemberId, ProposalId, TeamId, Timestamp, VoteChoice, VoteRecord};

    #[test]
    fn counts_sources_and_bonus() {
        let m = MemberId::new;
        let mut b = HierarchyBuilder::new();
        b.add_team(TeamId::new(1), Some(m(1)), None)
            .add_member(m(1), Some(TeamId::new(1)))
            .add_member(m(2), Some(TeamId::new(1)))
            .add_member(m(3), Some(TeamId::new(1)))
            .add_member(m(4), None)
            .add_member(m(5), None)
            .set_delegate(m(3), m(4));
        let h = b.build().unwrap();
        let ballots = Ballots::from_records(
            ProposalId::new(1),
            [(1, VoteChoice::Yes), (4, VoteChoice::Yes)].map(|(id, c)| {
                VoteRecord::new(ProposalId::new(1), m(id), c, Timestamp::new(0))
            }),
        );

        let report = breakdown(&h, &ballots, &GovernanceParams::default());
        assert_eq!(report.sources.direct, 2);
        assert_eq!(report.sources.team_leader, 1);
        assert_eq!(report.sources.delegate, 1);
        assert_eq!(report.sources.none, 1);
        assert_eq!(report.sources.total(), 5);
        // team of three all Yes: 3 -> 6, plus member 4 unaffiliated
        assert_eq!(report.unmultiplied.yes, 4);
        assert_eq!(report.multiplied.yes, 7);
        assert_eq!(report.multiplier_bonus, 3);
    }
}
