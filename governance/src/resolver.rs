//! Effective-vote resolution.
//!
//! A member's effective vote is the first of: their direct vote, the vote
//! reached through their delegation chain, or the direct vote of their team,
//! squad or union leader. The weight is always the member's own.

use crate::ballot::Ballots;
use crate::delegation::DelegationEngine;
use doctrine_organization::{Hierarchy, Level};
use doctrine_types::{MemberId, VoteChoice};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an effective vote came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteSource {
    Direct,
    Delegate,
    TeamLeader,
    SquadLeader,
    UnionLeader,
}

impl VoteSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Delegate => "delegate",
            Self::TeamLeader => "team_leader",
            Self::SquadLeader => "squad_leader",
            Self::UnionLeader => "union_leader",
        }
    }
}

impl fmt::Display for VoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveVote {
    pub choice: VoteChoice,
    pub source: VoteSource,
    /// Leader weight of the member being resolved.
    pub weight: u32,
    /// Member whose direct vote was inherited.
    pub via: MemberId,
}

/// Leader fallbacks, nearest first.
const FALLBACKS: [(Level, VoteSource); 3] = [
    (Level::Team, VoteSource::TeamLeader),
    (Level::Squad, VoteSource::SquadLeader),
    (Level::Union, VoteSource::UnionLeader),
];

/// Resolves effective votes against one hierarchy snapshot and one proposal's
/// ballots.
pub struct Resolver<'a> {
    hierarchy: &'a Hierarchy,
    ballots: &'a Ballots,
    delegations: DelegationEngine,
}

impl<'a> Resolver<'a> {
    pub fn new(hierarchy: &'a Hierarchy, ballots: &'a Ballots) -> Self {
        Self {
            hierarchy,
            ballots,
            delegations: DelegationEngine::from_hierarchy(hierarchy),
        }
    }

    pub fn hierarchy(&self) -> &'a Hierarchy {
        self.hierarchy
    }

    pub fn ballots(&self) -> &'a Ballots {
        self.ballots
    }

    /// Direct vote only, no inheritance.
    pub fn direct(&self, member: MemberId) -> Option<VoteChoice> {
        self.ballots.choice(member)
    }

    /// The effective vote of `member`, or `None` if nothing resolves.
    pub fn resolve(&self, member: MemberId) -> Option<EffectiveVote> {
        let weight = self.hierarchy.leader_weight(member);
        let found = self
            .direct(member)
            .map(|choice| (choice, VoteSource::Direct, member))
            .or_else(|| {
                self.through_delegates(member)
                    .map(|(choice, via)| (choice, VoteSource::Delegate, via))
            })
            .or_else(|| self.leader_fallback(member));

        let (choice, source, via) = found?;
        Some(EffectiveVote {
            choice,
            source,
            weight,
            via,
        })
    }

    /// Walk the delegation chain.
    ///
    /// Direct votes along the chain are taken in order. If none is found and
    /// the chain ends cleanly, leader fallbacks are tried from the deepest
    /// delegate back towards the member. A cycle reached before any direct
    /// vote yields nothing.
    fn through_delegates(&self, member: MemberId) -> Option<(VoteChoice, MemberId)> {
        let chain = self.delegations.chain(member);
        if chain.hops.is_empty() {
            return None;
        }
        for &hop in &chain.hops {
            if let Some(choice) = self.direct(hop) {
                return Some((choice, hop));
            }
        }
        if chain.cyclic {
            tracing::debug!(%member, hops = chain.hops.len(), "delegation cycle, no vote through delegates");
            return None;
        }
        chain
            .hops
            .iter()
            .rev()
            .find_map(|&hop| self.leader_fallback(hop))
            .map(|(choice, _, via)| (choice, via))
    }

    /// Direct vote of the nearest leader above `member` who voted.
    fn leader_fallback(&self, member: MemberId) -> Option<(VoteChoice, VoteSource, MemberId)> {
        FALLBACKS.iter().find_map(|&(level, source)| {
            let leader = self.hierarchy.enclosing_leader(member, level)?;
            if leader == member {
                return None;
            }
            self.direct(leader).map(|choice| (choice, source, leader))
        })
    }
}
