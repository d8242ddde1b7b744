//! Vote choices and direct vote records.

use crate::{MemberId, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three options a member can choose on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    Abstain,
    Veto,
}

impl VoteChoice {
    /// All choices in tally order.
    pub const ALL: [VoteChoice; 3] = [VoteChoice::Yes, VoteChoice::Abstain, VoteChoice::Veto];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::Abstain => "ABSTAIN",
            Self::Veto => "VETO",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A member's direct vote on one proposal. `(proposal, member)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal: ProposalId,
    pub member: MemberId,
    pub choice: VoteChoice,
    /// When the vote was first cast.
    pub cast_at: Timestamp,
    /// When the choice was last set (equals `cast_at` until the first change).
    pub last_changed_at: Timestamp,
}

impl VoteRecord {
    pub fn new(proposal: ProposalId, member: MemberId, choice: VoteChoice, now: Timestamp) -> Self {
        Self {
            proposal,
            member,
            choice,
            cast_at: now,
            last_changed_at: now,
        }
    }

    /// Earliest time at which this vote may be changed again.
    pub fn changeable_at(&self, cooldown_secs: u64) -> Timestamp {
        self.last_changed_at.plus_secs(cooldown_secs)
    }
}
