//! Numeric identifiers for members, organisational units and proposals.
//!
//! Identifiers are assigned by the external record-keeping system. The engine
//! never mints them; it only indexes and compares them.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// A registered member of the platform.
    MemberId,
    "member"
);
define_id!(
    /// A team (3–15 members, the smallest unit).
    TeamId,
    "team"
);
define_id!(
    /// A squad, grouping teams.
    SquadId,
    "squad"
);
define_id!(
    /// A union, grouping squads.
    UnionId,
    "union"
);
define_id!(
    /// A province organisation, grouping unions.
    ProvinceId,
    "province"
);
define_id!(
    /// A proposal to change the doctrine.
    ProposalId,
    "proposal"
);
