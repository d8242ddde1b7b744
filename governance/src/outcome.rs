//! Abstain redistribution and the acceptance decision.

use crate::aggregator::{Aggregation, Tally};
use doctrine_types::{ArticleTier, GovernanceParams, Outcome, ProposalStatus};

/// Hand the abstain pool to the larger of yes and veto. Ties go to yes.
///
/// `abstain` is passed separately because the pool is the unmultiplied
/// weighted abstain total, while yes and veto keep their multipliers.
pub fn redistribute_abstain(tally: &Tally, abstain: u64) -> Tally {
    let mut out = Tally {
        yes: tally.yes,
        abstain: 0,
        veto: tally.veto,
    };
    if out.yes >= out.veto {
        out.yes = out.yes.saturating_add(abstain);
    } else {
        out.veto = out.veto.saturating_add(abstain);
    }
    out
}

/// Whether `yes` out of `total_members` reaches `threshold_pct`.
///
/// Integer comparison, so exactly 85% passes an 85% threshold.
pub fn meets_threshold(yes: u64, total_members: u64, threshold_pct: u8) -> bool {
    total_members > 0 && u128::from(yes) * 100 >= u128::from(threshold_pct) * u128::from(total_members)
}

/// Turn an aggregation into a terminal outcome.
pub fn decide(
    aggregation: &Aggregation,
    total_members: u64,
    tier: ArticleTier,
    params: &GovernanceParams,
) -> Outcome {
    let threshold_pct = params.threshold_pct(tier);
    let final_tally = redistribute_abstain(&aggregation.tally, aggregation.unmultiplied.abstain);

    if final_tally.yes == 0 && final_tally.veto == 0 {
        return Outcome {
            status: ProposalStatus::Archived,
            yes_votes: 0,
            veto_votes: 0,
            abstain_votes: 0,
            total_members,
            yes_percentage: 0.0,
            threshold_pct,
        };
    }

    let yes_percentage = if total_members == 0 {
        0.0
    } else {
        final_tally.yes as f64 / total_members as f64 * 100.0
    };
    let status = if meets_threshold(final_tally.yes, total_members, threshold_pct) {
        ProposalStatus::Passed
    } else {
        ProposalStatus::Rejected
    };

    Outcome {
        status,
        yes_votes: final_tally.yes,
        veto_votes: final_tally.veto,
        abstain_votes: 0,
        total_members,
        yes_percentage,
        threshold_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(yes: u64, abstain: u64, veto: u64) -> Aggregation {
        let tally = Tally { yes, abstain, veto };
        Aggregation {
            tally,
            unmultiplied: tally,
            ..Aggregation::default()
        }
    }

    #[test]
    fn abstain_goes_to_the_larger_side() {
        let out = redistribute_abstain(&Tally { yes: 10, abstain: 5, veto: 3 }, 5);
        assert_eq!(out, Tally { yes: 15, abstain: 0, veto: 3 });

        let out = redistribute_abstain(&Tally { yes: 2, abstain: 4, veto: 3 }, 4);
        assert_eq!(out, Tally { yes: 2, abstain: 0, veto: 7 });
    }

    #[test]
    fn abstain_tie_goes_to_yes() {
        let out = redistribute_abstain(&Tally { yes: 3, abstain: 1, veto: 3 }, 1);
        assert_eq!(out.yes, 4);
    }

    #[test]
    fn abstain_pool_is_unmultiplied() {
        let aggregation = Aggregation {
            tally: Tally { yes: 20, abstain: 16, veto: 0 },
            unmultiplied: Tally { yes: 10, abstain: 2, veto: 0 },
            ..Aggregation::default()
        };
        let outcome = decide(&aggregation, 100, ArticleTier::Normal, &GovernanceParams::default());
        assert_eq!(outcome.yes_votes, 22);
    }

    #[test]
    fn foundation_threshold_edges() {
        let params = GovernanceParams::default();
        let fail = decide(&agg(849, 0, 1), 1000, ArticleTier::Foundation, &params);
        assert_eq!(fail.status, ProposalStatus::Rejected);
        let pass = decide(&agg(850, 0, 1), 1000, ArticleTier::Foundation, &params);
        assert_eq!(pass.status, ProposalStatus::Passed);
        assert_eq!(pass.threshold_pct, 85);
        assert!((pass.yes_percentage - 85.0).abs() < 1e-9);
    }

    #[test]
    fn normal_threshold_edges() {
        let params = GovernanceParams::default();
        let fail = decide(&agg(749, 0, 0), 1000, ArticleTier::Normal, &params);
        assert_eq!(fail.status, ProposalStatus::Rejected);
        let pass = decide(&agg(750, 0, 0), 1000, ArticleTier::Normal, &params);
        assert_eq!(pass.status, ProposalStatus::Passed);
        assert_eq!(pass.threshold_pct, 75);
    }

    #[test]
    fn no_votes_archives() {
        let outcome = decide(&agg(0, 0, 0), 10, ArticleTier::Normal, &GovernanceParams::default());
        assert_eq!(outcome.status, ProposalStatus::Archived);
        assert_eq!(outcome.yes_percentage, 0.0);
    }

    #[test]
    fn abstain_only_goes_to_yes() {
        let outcome = decide(&agg(0, 3, 0), 4, ArticleTier::Normal, &GovernanceParams::default());
        assert_eq!(outcome.yes_votes, 3);
        assert_eq!(outcome.status, ProposalStatus::Passed);
    }

    #[test]
    fn zero_membership_is_rejected() {
        assert!(!meets_threshold(5, 0, 75));
        let outcome = decide(&agg(5, 0, 0), 0, ArticleTier::Normal, &GovernanceParams::default());
        assert_eq!(outcome.status, ProposalStatus::Rejected);
        assert_eq!(outcome.yes_percentage, 0.0);
    }
}
