//! End-to-end tabulation scenarios over small hand-built organisations.

use doctrine_governance::{aggregate, decide, Ballots, Resolver};
use doctrine_organization::{Hierarchy, HierarchyBuilder};
use doctrine_types::{
    ArticleTier, GovernanceParams, MemberId, ProposalId, ProposalStatus, SquadId, TeamId,
    Timestamp, VoteChoice, VoteRecord,
};

const PROPOSAL: ProposalId = ProposalId::new(1);

fn m(id: u64) -> MemberId {
    MemberId::new(id)
}

fn ballots(votes: impl IntoIterator<Item = (u64, VoteChoice)>) -> Ballots {
    Ballots::from_records(
        PROPOSAL,
        votes
            .into_iter()
            .map(|(id, choice)| VoteRecord::new(PROPOSAL, m(id), choice, Timestamp::new(0))),
    )
}

fn unaffiliated(n: u64) -> Hierarchy {
    let mut b = HierarchyBuilder::new();
    for id in 1..=n {
        b.add_member(m(id), None);
    }
    b.build().unwrap()
}

fn finalize(h: &Hierarchy, b: &Ballots, tier: ArticleTier) -> doctrine_types::Outcome {
    let params = GovernanceParams::default();
    let agg = aggregate(h, b, &params);
    decide(&agg, h.member_count() as u64, tier, &params)
}

#[test]
fn standalone_team_unanimity_doubles_and_dissent_does_not() {
    let mut b = HierarchyBuilder::new();
    b.add_team(TeamId::new(1), Some(m(1)), None);
    for id in 1..=6 {
        b.add_member(m(id), Some(TeamId::new(1)));
    }
    let h = b.build().unwrap();
    let params = GovernanceParams::default();

    let all_yes = ballots((1..=6).map(|id| (id, VoteChoice::Yes)));
    assert_eq!(aggregate(&h, &all_yes, &params).tally.yes, 12);

    let dissent = ballots((1..=6).map(|id| {
        let choice = if id == 6 { VoteChoice::Veto } else { VoteChoice::Yes };
        (id, choice)
    }));
    let agg = aggregate(&h, &dissent, &params);
    assert_eq!((agg.tally.yes, agg.tally.veto), (5, 1));
}

#[test]
fn abstentions_join_the_majority_side() {
    let h = unaffiliated(18);
    let votes = (1..=18).map(|id| {
        let choice = match id {
            1..=10 => VoteChoice::Yes,
            11..=13 => VoteChoice::Veto,
            _ => VoteChoice::Abstain,
        };
        (id, choice)
    });
    let outcome = finalize(&h, &ballots(votes), ArticleTier::Normal);
    assert_eq!(outcome.yes_votes, 15);
    assert_eq!(outcome.veto_votes, 3);
    assert_eq!(outcome.abstain_votes, 0);
}

#[test]
fn foundational_threshold_is_inclusive() {
    let h = unaffiliated(1000);
    let below = finalize(
        &h,
        &ballots((1..=849).map(|id| (id, VoteChoice::Yes))),
        ArticleTier::Foundation,
    );
    assert_eq!(below.status, ProposalStatus::Rejected);

    let exact = finalize(
        &h,
        &ballots((1..=850).map(|id| (id, VoteChoice::Yes))),
        ArticleTier::Foundation,
    );
    assert_eq!(exact.status, ProposalStatus::Passed);
    assert_eq!(exact.total_members, 1000);
}

#[test]
fn normal_threshold_is_inclusive() {
    let h = unaffiliated(1000);
    let below = finalize(
        &h,
        &ballots((1..=749).map(|id| (id, VoteChoice::Yes))),
        ArticleTier::Normal,
    );
    assert_eq!(below.status, ProposalStatus::Rejected);
    let exact = finalize(
        &h,
        &ballots((1..=750).map(|id| (id, VoteChoice::Yes))),
        ArticleTier::Normal,
    );
    assert_eq!(exact.status, ProposalStatus::Passed);
}

#[test]
fn no_votes_archives_the_proposal() {
    let h = unaffiliated(5);
    let outcome = finalize(&h, &ballots([]), ArticleTier::Normal);
    assert_eq!(outcome.status, ProposalStatus::Archived);
    assert_eq!(outcome.yes_percentage, 0.0);
}

#[test]
fn delegation_cycle_without_votes_resolves_to_nothing() {
    let mut b = HierarchyBuilder::new();
    b.add_member(m(1), None)
        .add_member(m(2), None)
        .set_delegate(m(1), m(2))
        .set_delegate(m(2), m(1));
    let h = b.build().unwrap();
    let empty = ballots([]);
    let resolver = Resolver::new(&h, &empty);
    assert!(resolver.resolve(m(1)).is_none());
    assert!(resolver.resolve(m(2)).is_none());
    assert_eq!(
        finalize(&h, &empty, ArticleTier::Normal).status,
        ProposalStatus::Archived
    );
}

/// Three teams of five under one standalone squad. Member 1 leads the squad
/// and team 1 (weight 2); members 6 and 11 lead teams 2 and 3.
#[test]
fn standalone_squad_multiplier_replaces_team_multiplier() {
    let mut b = HierarchyBuilder::new();
    b.add_squad(SquadId::new(1), Some(m(1)), None);
    for t in 0..3u64 {
        let team = TeamId::new(t + 1);
        b.add_team(team, Some(m(t * 5 + 1)), Some(SquadId::new(1)));
        for i in 1..=5 {
            b.add_member(m(t * 5 + i), Some(team));
        }
    }
    let h = b.build().unwrap();
    assert!(h.diagnostics().is_empty());
    assert_eq!(h.leader_weight(m(1)), 2);

    let agg = aggregate(
        &h,
        &ballots((1..=15).map(|id| (id, VoteChoice::Yes))),
        &GovernanceParams::default(),
    );
    assert_eq!(agg.unmultiplied.yes, 16);
    assert_eq!(agg.tally.yes, 64);
    assert_eq!(agg.multipliers.len(), 1);
    assert_eq!(agg.multipliers[0].factor, 4);
    assert_eq!(agg.buckets.standalone_squads, 15);
    assert_eq!(agg.buckets.standalone_teams, 0);

    let outcome = decide(&agg, 15, ArticleTier::Normal, &GovernanceParams::default());
    assert_eq!(outcome.status, ProposalStatus::Passed);
}
