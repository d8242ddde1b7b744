//! Hierarchy levels and references to concrete units.

use doctrine_types::{ProvinceId, SquadId, TeamId, UnionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four nested organisational levels, smallest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Team,
    Squad,
    Union,
    Province,
}

impl Level {
    /// All levels, bottom-up.
    pub const ALL: [Level; 4] = [Level::Team, Level::Squad, Level::Union, Level::Province];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Squad => "squad",
            Self::Union => "union",
            Self::Province => "province",
        }
    }

    /// Vote weight of a member who leads a unit at this level.
    ///
    /// Team leaders carry no extra weight.
    pub fn leader_weight(&self) -> u32 {
        match self {
            Self::Team => 1,
            Self::Squad => 2,
            Self::Union => 3,
            Self::Province => 4,
        }
    }

    /// The level directly above this one.
    pub fn parent(&self) -> Option<Level> {
        match self {
            Self::Team => Some(Self::Squad),
            Self::Squad => Some(Self::Union),
            Self::Union => Some(Self::Province),
            Self::Province => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to one organisational unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRef {
    Team(TeamId),
    Squad(SquadId),
    Union(UnionId),
    Province(ProvinceId),
}

impl UnitRef {
    pub fn level(&self) -> Level {
        match self {
            Self::Team(_) => Level::Team,
            Self::Squad(_) => Level::Squad,
            Self::Union(_) => Level::Union,
            Self::Province(_) => Level::Province,
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team(id) => write!(f, "{id}"),
            Self::Squad(id) => write!(f, "{id}"),
            Self::Union(id) => write!(f, "{id}"),
            Self::Province(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_weights_are_monotonic() {
        let weights: Vec<u32> = Level::ALL.iter().map(Level::leader_weight).collect();
        assert_eq!(weights, vec![1, 2, 3, 4]);
    }

    #[test]
    fn parent_chain_ends_at_province() {
        let mut level = Level::Team;
        let mut steps = 0;
        while let Some(parent) = level.parent() {
            level = parent;
            steps += 1;
        }
        assert_eq!(level, Level::Province);
        assert_eq!(steps, 3);
    }

    #[test]
    fn unit_ref_reports_its_level() {
        assert_eq!(UnitRef::Union(UnionId::new(4)).level(), Level::Union);
        assert_eq!(UnitRef::Team(TeamId::new(9)).to_string(), "team#9");
    }
}
