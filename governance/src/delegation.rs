//! Vote delegation between members.
//!
//! A member may entrust their vote to one other member. Chains are
//! transitive (A→B→C) and are walked with a visited set, so a cycle ends the
//! walk instead of looping. There is no depth limit.

use crate::error::GovernanceError;
use doctrine_organization::Hierarchy;
use doctrine_types::MemberId;
use std::collections::{HashMap, HashSet};

/// Result of following a member's delegation chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationChain {
    /// Delegates in the order they were reached, excluding the starting member.
    pub hops: Vec<MemberId>,
    /// The chain led back to a member already on it.
    pub cyclic: bool,
}

/// delegator → delegate edges of one snapshot.
#[derive(Clone, Debug, Default)]
pub struct DelegationEngine {
    delegations: HashMap<MemberId, MemberId>,
}

impl DelegationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the delegations recorded in a hierarchy snapshot.
    pub fn from_hierarchy(hierarchy: &Hierarchy) -> Self {
        let delegations = hierarchy
            .members()
            .iter()
            .filter_map(|m| m.delegate.map(|to| (m.id, to)))
            .collect();
        Self { delegations }
    }

    /// Set or replace a delegation.
    pub fn delegate(&mut self, from: MemberId, to: MemberId) -> Result<(), GovernanceError> {
        if from == to {
            return Err(GovernanceError::SelfDelegation(from));
        }
        self.delegations.insert(from, to);
        Ok(())
    }

    /// Follow the chain starting at `from` until it ends or repeats.
    pub fn chain(&self, from: MemberId) -> DelegationChain {
        let mut visited = HashSet::from([from]);
        let mut hops = Vec::new();
        let mut current = from;
        while let Some(&next) = self.delegations.get(&current) {
            if !visited.insert(next) {
                return DelegationChain { hops, cyclic: true };
            }
            hops.push(next);
            current = next;
        }
        DelegationChain {
            hops,
            cyclic: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrine_organization::HierarchyBuilder;

    fn m(id: u64) -> MemberId {
        MemberId::new(id)
    }

    #[test]
    fn test_transitive_chain() {
        let mut engine = DelegationEngine::new();
        engine.delegate(m(1), m(2)).unwrap();
        engine.delegate(m(2), m(3)).unwrap();
        let chain = engine.chain(m(1));
        assert_eq!(chain.hops, vec![m(2), m(3)]);
        assert!(!chain.cyclic);
        assert!(engine.chain(m(3)).hops.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let mut engine = DelegationEngine::new();
        engine.delegate(m(1), m(2)).unwrap();
        engine.delegate(m(2), m(3)).unwrap();
        engine.delegate(m(3), m(2)).unwrap();
        let chain = engine.chain(m(1));
        assert!(chain.cyclic);
        assert_eq!(chain.hops, vec![m(2), m(3)]);
    }

    #[test]
    fn test_self_delegation_rejected() {
        let mut engine = DelegationEngine::new();
        assert!(matches!(
            engine.delegate(m(4), m(4)),
            Err(GovernanceError::SelfDelegation(id)) if id == m(4)
        ));
        assert!(engine.chain(m(4)).hops.is_empty());
    }

    #[test]
    fn test_redelegate_replaces_edge() {
        let mut engine = DelegationEngine::new();
        engine.delegate(m(1), m(2)).unwrap();
        engine.delegate(m(1), m(4)).unwrap();
        assert_eq!(engine.chain(m(1)).hops, vec![m(4)]);
    }

    #[test]
    fn test_loads_edges_from_hierarchy() {
        let mut b = HierarchyBuilder::new();
        for id in 1..=3 {
            b.add_member(m(id), None);
        }
        b.set_delegate(m(1), m(2)).set_delegate(m(2), m(3));
        let h = b.build().unwrap();
        let engine = DelegationEngine::from_hierarchy(&h);
        assert_eq!(engine.chain(m(1)).hops, vec![m(2), m(3)]);
    }
}
