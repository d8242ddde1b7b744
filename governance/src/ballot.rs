//! Direct votes of one proposal and the rules for casting them.

use crate::error::GovernanceError;
use doctrine_organization::Hierarchy;
use doctrine_types::{
    GovernanceParams, MemberId, Proposal, ProposalId, ProposalStatus, Timestamp, VoteChoice,
    VoteRecord,
};
use std::collections::HashMap;

/// Validate a direct vote and produce the record to store.
///
/// `previous` is the member's current vote on the same proposal, if any.
/// Re-casting the current choice is accepted and returns the stored record
/// unchanged, so it does not restart the change cooldown.
pub fn prepare_vote(
    proposal: &Proposal,
    hierarchy: &Hierarchy,
    previous: Option<&VoteRecord>,
    member: MemberId,
    choice: VoteChoice,
    now: Timestamp,
    params: &GovernanceParams,
) -> Result<VoteRecord, GovernanceError> {
    if proposal.status != ProposalStatus::Active {
        return Err(GovernanceError::ProposalClosed {
            proposal: proposal.id,
            status: proposal.status,
        });
    }
    if !proposal.accepts_votes(now) {
        return Err(GovernanceError::VotingClosed {
            proposal: proposal.id,
            closes_at: proposal.closes_at,
        });
    }
    let record = hierarchy
        .member(member)
        .ok_or(GovernanceError::MemberNotFound(member))?;
    if record.team.is_none() && !params.allow_unaffiliated_votes {
        return Err(GovernanceError::NoTeam(member));
    }

    match previous {
        None => Ok(VoteRecord::new(proposal.id, member, choice, now)),
        Some(prev) if prev.choice == choice => Ok(prev.clone()),
        Some(prev) => {
            let retry_at = prev.changeable_at(params.vote_change_cooldown_secs);
            if now < retry_at {
                return Err(GovernanceError::VoteChangeTooSoon { member, retry_at });
            }
            Ok(VoteRecord {
                choice,
                last_changed_at: now,
                ..prev.clone()
            })
        }
    }
}

/// The direct votes cast on one proposal, keyed by member.
#[derive(Clone, Debug)]
pub struct Ballots {
    proposal: ProposalId,
    votes: HashMap<MemberId, VoteRecord>,
}

impl Ballots {
    pub fn new(proposal: ProposalId) -> Self {
        Self {
            proposal,
            votes: HashMap::new(),
        }
    }

    /// Collect stored vote records. Records of other proposals are skipped.
    pub fn from_records(proposal: ProposalId, records: impl IntoIterator<Item = VoteRecord>) -> Self {
        let mut ballots = Self::new(proposal);
        for record in records {
            if record.proposal != proposal {
                tracing::warn!(
                    expected = %proposal,
                    got = %record.proposal,
                    member = %record.member,
                    "skipping vote record of another proposal"
                );
                continue;
            }
            ballots.votes.insert(record.member, record);
        }
        ballots
    }

    pub fn proposal(&self) -> ProposalId {
        self.proposal
    }

    pub fn get(&self, member: MemberId) -> Option<&VoteRecord> {
        self.votes.get(&member)
    }

    /// The member's direct choice, if they voted.
    pub fn choice(&self, member: MemberId) -> Option<VoteChoice> {
        self.votes.get(&member).map(|v| v.choice)
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoteRecord> {
        self.votes.values()
    }

    /// Cast or change a direct vote, applying the write-path rules.
    pub fn cast(
        &mut self,
        proposal: &Proposal,
        hierarchy: &Hierarchy,
        member: MemberId,
        choice: VoteChoice,
        now: Timestamp,
        params: &GovernanceParams,
    ) -> Result<&VoteRecord, GovernanceError> {
        if proposal.id != self.proposal {
            return Err(GovernanceError::WrongProposal {
                expected: proposal.id,
                got: self.proposal,
            });
        }
        let record = prepare_vote(
            proposal,
            hierarchy,
            self.votes.get(&member),
            member,
            choice,
            now,
            params,
        )?;
        tracing::debug!(%member, %choice, proposal = %self.proposal, "direct vote recorded");
        self.votes.insert(member, record);
        Ok(&self.votes[&member])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrine_organization::HierarchyBuilder;
    use doctrine_types::time::DAY_SECS;
    use doctrine_types::{ArticleTier, ProposalKind, TeamId};

    fn m(id: u64) -> MemberId {
        MemberId::new(id)
    }

    fn setup() -> (Proposal, Hierarchy, GovernanceParams) {
        let params = GovernanceParams::default();
        let proposal = Proposal::open(
            ProposalId::new(1),
            ProposalKind::Add,
            ArticleTier::Normal,
            Timestamp::new(0),
            params.voting_window_secs,
        );
        let mut b = HierarchyBuilder::new();
        b.add_team(TeamId::new(1), Some(m(1)), None)
            .add_member(m(1), Some(TeamId::new(1)))
            .add_member(m(2), None);
        (proposal, b.build().unwrap(), params)
    }

    #[test]
    fn first_vote_sets_both_timestamps() {
        let (proposal, h, params) = setup();
        let mut ballots = Ballots::new(proposal.id);
        let vote = ballots
            .cast(&proposal, &h, m(1), VoteChoice::Yes, Timestamp::new(10), &params)
            .unwrap();
        assert_eq!(vote.cast_at, Timestamp::new(10));
        assert_eq!(vote.last_changed_at, Timestamp::new(10));
    }

    #[test]
    fn change_respects_cooldown() {
        let (proposal, h, params) = setup();
        let mut ballots = Ballots::new(proposal.id);
        ballots
            .cast(&proposal, &h, m(1), VoteChoice::Yes, Timestamp::new(10), &params)
            .unwrap();

        let err = ballots
            .cast(&proposal, &h, m(1), VoteChoice::Veto, Timestamp::new(DAY_SECS), &params)
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::VoteChangeTooSoon { retry_at, .. } if retry_at == Timestamp::new(10 + DAY_SECS)
        ));

        let changed = ballots
            .cast(&proposal, &h, m(1), VoteChoice::Veto, Timestamp::new(10 + DAY_SECS), &params)
            .unwrap();
        assert_eq!(changed.choice, VoteChoice::Veto);
        assert_eq!(changed.cast_at, Timestamp::new(10));
        assert_eq!(changed.last_changed_at, Timestamp::new(10 + DAY_SECS));
    }

    #[test]
    fn same_choice_does_not_restart_cooldown() {
        let (proposal, h, params) = setup();
        let mut ballots = Ballots::new(proposal.id);
        ballots
            .cast(&proposal, &h, m(1), VoteChoice::Yes, Timestamp::new(10), &params)
            .unwrap();
        let again = ballots
            .cast(&proposal, &h, m(1), VoteChoice::Yes, Timestamp::new(20), &params)
            .unwrap();
        assert_eq!(again.last_changed_at, Timestamp::new(10));
    }

    #[test]
    fn unaffiliated_member_cannot_vote_by_default() {
        let (proposal, h, params) = setup();
        let mut ballots = Ballots::new(proposal.id);
        assert!(matches!(
            ballots.cast(&proposal, &h, m(2), VoteChoice::Yes, Timestamp::new(1), &params),
            Err(GovernanceError::NoTeam(_))
        ));

        let open = GovernanceParams {
            allow_unaffiliated_votes: true,
            ..params
        };
        assert!(ballots
            .cast(&proposal, &h, m(2), VoteChoice::Yes, Timestamp::new(1), &open)
            .is_ok());
    }

    #[test]
    fn closed_window_and_terminal_status_are_rejected() {
        let (mut proposal, h, params) = setup();
        let mut ballots = Ballots::new(proposal.id);
        let late = proposal.closes_at;
        assert!(matches!(
            ballots.cast(&proposal, &h, m(1), VoteChoice::Yes, late, &params),
            Err(GovernanceError::VotingClosed { .. })
        ));

        proposal.status = ProposalStatus::Archived;
        assert!(matches!(
            ballots.cast(&proposal, &h, m(1), VoteChoice::Yes, Timestamp::new(1), &params),
            Err(GovernanceError::ProposalClosed { .. })
        ));
    }

    #[test]
    fn from_records_skips_foreign_votes() {
        let ballots = Ballots::from_records(
            ProposalId::new(1),
            vec![
                VoteRecord::new(ProposalId::new(1), m(1), VoteChoice::Yes, Timestamp::new(0)),
                VoteRecord::new(ProposalId::new(2), m(2), VoteChoice::Veto, Timestamp::new(0)),
            ],
        );
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots.choice(m(1)), Some(VoteChoice::Yes));
        assert_eq!(ballots.choice(m(2)), None);
    }
}
