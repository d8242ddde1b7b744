//! Doctrine proposals and their lifecycle.

use crate::error::DoctrineError;
use crate::{ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a proposal does to the doctrine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Add a new article.
    Add,
    /// Change the text of an existing article.
    Modify,
    /// Remove an article.
    Remove,
    /// General revision submitted by a founder.
    FounderRevision,
    /// Rename the doctrine or an article.
    NameChange,
}

/// Classification of the article a proposal targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleTier {
    /// Highest tier; changes need the foundational threshold.
    Foundation,
    /// Ordinary programme article. Proposals without a related article are `Normal`.
    #[default]
    Normal,
}

/// Lifecycle status. `Active` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Archived,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Passed => "PASSED",
            Self::Rejected => "REJECTED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cached tally counters written back by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTally {
    pub yes: u64,
    pub abstain: u64,
    pub veto: u64,
}

/// Final result of tabulating a proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: ProposalStatus,
    /// Yes total after multipliers and abstain redistribution.
    pub yes_votes: u64,
    /// Veto total after multipliers and abstain redistribution.
    pub veto_votes: u64,
    /// Always zero once abstentions have been redistributed.
    pub abstain_votes: u64,
    /// Every member known to the snapshot, voting or not.
    pub total_members: u64,
    /// `yes_votes / total_members * 100`, for display.
    pub yes_percentage: f64,
    /// Acceptance threshold applied, in whole percent.
    pub threshold_pct: u8,
}

/// A proposal as seen by the tally engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub kind: ProposalKind,
    /// Tier of the targeted article; decides the acceptance threshold.
    pub target_tier: ArticleTier,
    pub status: ProposalStatus,
    pub opens_at: Timestamp,
    pub closes_at: Timestamp,
    /// Last tally written back (live or final).
    pub cached: CachedTally,
    /// Recorded when the proposal reached a terminal status.
    pub outcome: Option<Outcome>,
}

impl Proposal {
    /// Open a new proposal whose voting window starts at `created_at`.
    pub fn open(
        id: ProposalId,
        kind: ProposalKind,
        target_tier: ArticleTier,
        created_at: Timestamp,
        window_secs: u64,
    ) -> Self {
        Self {
            id,
            kind,
            target_tier,
            status: ProposalStatus::Active,
            opens_at: created_at,
            closes_at: created_at.plus_secs(window_secs),
            cached: CachedTally::default(),
            outcome: None,
        }
    }

    pub fn is_foundational(&self) -> bool {
        self.target_tier == ArticleTier::Foundation
    }

    /// Whether votes may still be cast at `now`.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Active && now >= self.opens_at && now < self.closes_at
    }

    /// Whether the voting window has elapsed at `now`.
    pub fn has_closed(&self, now: Timestamp) -> bool {
        now >= self.closes_at
    }

    /// Move an active proposal into a terminal status, recording the outcome.
    pub fn conclude(&mut self, outcome: Outcome) -> Result<(), DoctrineError> {
        if self.status.is_terminal() {
            return Err(DoctrineError::TerminalProposal {
                proposal: self.id,
                status: self.status,
            });
        }
        if !outcome.status.is_terminal() {
            return Err(DoctrineError::InvalidTransition {
                from: self.status,
                to: outcome.status,
            });
        }
        self.status = outcome.status;
        self.cached = CachedTally {
            yes: outcome.yes_votes,
            abstain: outcome.abstain_votes,
            veto: outcome.veto_votes,
        };
        self.outcome = Some(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::DAY_SECS;

    fn proposal() -> Proposal {
        Proposal::open(
            ProposalId::new(1),
            ProposalKind::Modify,
            ArticleTier::Normal,
            Timestamp::new(1_000),
            14 * DAY_SECS,
        )
    }

    fn outcome(status: ProposalStatus) -> Outcome {
        Outcome {
            status,
            yes_votes: 9,
            veto_votes: 1,
            abstain_votes: 0,
            total_members: 10,
            yes_percentage: 90.0,
            threshold_pct: 75,
        }
    }

    #[test]
    fn window_is_fourteen_days() {
        let p = proposal();
        assert_eq!(p.closes_at.as_secs() - p.opens_at.as_secs(), 14 * DAY_SECS);
        assert!(p.accepts_votes(Timestamp::new(1_000)));
        assert!(!p.accepts_votes(p.closes_at));
        assert!(p.has_closed(p.closes_at));
    }

    #[test]
    fn conclude_sets_status_and_cache() {
        let mut p = proposal();
        p.conclude(outcome(ProposalStatus::Passed)).unwrap();
        assert_eq!(p.status, ProposalStatus::Passed);
        assert_eq!(p.cached.yes, 9);
        assert!(p.outcome.is_some());
    }

    #[test]
    fn terminal_proposal_cannot_conclude_again() {
        let mut p = proposal();
        p.conclude(outcome(ProposalStatus::Rejected)).unwrap();
        let err = p.conclude(outcome(ProposalStatus::Passed)).unwrap_err();
        assert!(matches!(err, DoctrineError::TerminalProposal { .. }));
        assert_eq!(p.status, ProposalStatus::Rejected);
    }

    #[test]
    fn conclude_to_active_is_rejected() {
        let mut p = proposal();
        assert!(p.conclude(outcome(ProposalStatus::Active)).is_err());
    }
}
