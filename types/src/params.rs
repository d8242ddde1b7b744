//! Governance parameters: multipliers, thresholds, windows and unit minima.
//!
//! Defaults reproduce the platform rules. Every field can be overridden from the
//! `[governance]` table of the tally configuration.

use crate::error::DoctrineError;
use crate::proposal::ArticleTier;
use crate::time::DAY_SECS;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    // ── Multipliers ──────────────────────────────────────────────────────
    /// Applied to a standalone team whose members all resolved to the same choice.
    pub team_multiplier: u64,
    /// Applied to a standalone squad whose leader and all team leaders agree.
    pub squad_multiplier: u64,
    /// Applied to a union whose leader and all squad leaders agree.
    pub union_multiplier: u64,

    // ── Acceptance thresholds (percent of total membership) ─────────────
    pub foundation_threshold_pct: u8,
    pub normal_threshold_pct: u8,

    // ── Write path ───────────────────────────────────────────────────────
    /// Length of the voting window from proposal creation.
    pub voting_window_secs: u64,
    /// Minimum time between two changes of the same direct vote.
    pub vote_change_cooldown_secs: u64,
    /// Let members without a team cast direct votes.
    pub allow_unaffiliated_votes: bool,

    // ── Unit minima (organisational layer) ───────────────────────────────
    pub team_min_members: u32,
    pub team_max_members: u32,
    pub squad_min_members: u32,
    pub union_min_members: u32,
    pub province_min_members: u32,
    /// Active children a squad, union or province needs to stay active.
    pub min_active_children: u32,
}

impl GovernanceParams {
    /// Acceptance threshold for a proposal targeting an article of `tier`.
    pub fn threshold_pct(&self, tier: ArticleTier) -> u8 {
        match tier {
            ArticleTier::Foundation => self.foundation_threshold_pct,
            ArticleTier::Normal => self.normal_threshold_pct,
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), DoctrineError> {
        for (name, factor) in [
            ("team_multiplier", self.team_multiplier),
            ("squad_multiplier", self.squad_multiplier),
            ("union_multiplier", self.union_multiplier),
        ] {
            if factor == 0 {
                return Err(DoctrineError::InvalidParam {
                    name,
                    reason: "multiplier must be at least 1".into(),
                });
            }
        }
        for (name, pct) in [
            ("foundation_threshold_pct", self.foundation_threshold_pct),
            ("normal_threshold_pct", self.normal_threshold_pct),
        ] {
            if pct > 100 {
                return Err(DoctrineError::InvalidParam {
                    name,
                    reason: format!("{pct} exceeds 100 percent"),
                });
            }
        }
        if self.voting_window_secs == 0 {
            return Err(DoctrineError::InvalidParam {
                name: "voting_window_secs",
                reason: "voting window cannot be empty".into(),
            });
        }
        if self.team_min_members > self.team_max_members {
            return Err(DoctrineError::InvalidParam {
                name: "team_min_members",
                reason: "minimum team size exceeds maximum".into(),
            });
        }
        Ok(())
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            team_multiplier: 2,
            squad_multiplier: 4,
            union_multiplier: 8,
            foundation_threshold_pct: 85,
            normal_threshold_pct: 75,
            voting_window_secs: 14 * DAY_SECS,
            vote_change_cooldown_secs: DAY_SECS,
            allow_unaffiliated_votes: false,
            team_min_members: 3,
            team_max_members: 15,
            squad_min_members: 45,
            union_min_members: 135,
            province_min_members: 375,
            min_active_children: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = GovernanceParams::default();
        params.validate().unwrap();
        assert_eq!(params.threshold_pct(ArticleTier::Foundation), 85);
        assert_eq!(params.threshold_pct(ArticleTier::Normal), 75);
    }

    #[test]
    fn zero_multiplier_is_invalid() {
        let params = GovernanceParams {
            squad_multiplier: 0,
            ..GovernanceParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(
            err,
            DoctrineError::InvalidParam { name: "squad_multiplier", .. }
        ));
    }

    #[test]
    fn threshold_over_hundred_is_invalid() {
        let params = GovernanceParams {
            normal_threshold_pct: 101,
            ..GovernanceParams::default()
        };
        assert!(params.validate().is_err());
    }
}
