use proptest::prelude::*;
use std::collections::HashSet;

use doctrine_organization::{evaluate_activity, HierarchyBuilder};
use doctrine_types::{
    GovernanceParams, MemberId, OrganizationRecords, ProvinceId, SquadId, TeamId, UnionId,
};

/// Pick a parent id in `1..=count` from a random byte, or none.
fn parent(pick: Option<u8>, count: usize) -> Option<u64> {
    match (pick, count) {
        (Some(i), n) if n > 0 => Some(i as u64 % n as u64 + 1),
        _ => None,
    }
}

fn records_strategy() -> impl Strategy<Value = OrganizationRecords> {
    (
        prop::collection::vec(any::<bool>(), 0..3),
        prop::collection::vec((any::<Option<u8>>(), any::<bool>()), 0..5),
        prop::collection::vec((any::<Option<u8>>(), any::<bool>()), 0..8),
        prop::collection::vec((any::<Option<u8>>(), any::<bool>()), 0..12),
        prop::collection::vec(any::<Option<u8>>(), 0..80),
    )
        .prop_map(|(provinces, unions, squads, teams, members)| {
            let mut b = HierarchyBuilder::new();
            for (i, _) in provinces.iter().enumerate() {
                b.add_province(ProvinceId::new(i as u64 + 1), None);
            }
            for (i, (p, _)) in unions.iter().enumerate() {
                b.add_union(
                    UnionId::new(i as u64 + 1),
                    None,
                    parent(*p, provinces.len()).map(ProvinceId::new),
                );
            }
            for (i, (u, _)) in squads.iter().enumerate() {
                b.add_squad(
                    SquadId::new(i as u64 + 1),
                    None,
                    parent(*u, unions.len()).map(UnionId::new),
                );
            }
            for (i, (s, _)) in teams.iter().enumerate() {
                b.add_team(
                    TeamId::new(i as u64 + 1),
                    None,
                    parent(*s, squads.len()).map(SquadId::new),
                );
            }
            for (i, t) in members.iter().enumerate() {
                b.add_member(
                    MemberId::new(i as u64 + 1),
                    parent(*t, teams.len()).map(TeamId::new),
                );
            }
            let mut records = b.into_records();
            for (record, active) in records.provinces.iter_mut().zip(&provinces) {
                record.active = *active;
            }
            for (record, (_, active)) in records.unions.iter_mut().zip(&unions) {
                record.active = *active;
            }
            for (record, (_, active)) in records.squads.iter_mut().zip(&squads) {
                record.active = *active;
            }
            for (record, (_, active)) in records.teams.iter_mut().zip(&teams) {
                record.active = *active;
            }
            records
        })
}

proptest! {
    /// Every member lands in exactly one aggregation bucket: a union, a
    /// standalone squad, a standalone team, or the unaffiliated set.
    #[test]
    fn members_partition_into_buckets(records in records_strategy()) {
        let h = HierarchyBuilder::from_records(records).build().unwrap();

        let mut seen = HashSet::new();
        let mut total = 0usize;
        for union in h.unions() {
            for m in h.members_under_union(union.id) {
                prop_assert!(seen.insert(m), "{} counted twice", m);
                total += 1;
            }
        }
        for squad in h.standalone_squads() {
            for m in h.members_under_squad(squad.id) {
                prop_assert!(seen.insert(m), "{} counted twice", m);
                total += 1;
            }
        }
        for team in h.standalone_teams() {
            for &m in h.members_of(team.id) {
                prop_assert!(seen.insert(m), "{} counted twice", m);
                total += 1;
            }
        }
        for member in h.unaffiliated_members() {
            prop_assert!(seen.insert(member.id), "{} counted twice", member.id);
            total += 1;
        }
        prop_assert_eq!(total, h.member_count());
    }

    /// Applying an activity report leaves nothing further to deactivate.
    #[test]
    fn activity_evaluation_settles_in_one_pass(records in records_strategy()) {
        let params = GovernanceParams {
            squad_min_members: 4,
            union_min_members: 8,
            province_min_members: 12,
            min_active_children: 2,
            ..GovernanceParams::default()
        };
        let mut records = records;
        let report = evaluate_activity(&records, &params);
        report.apply(&mut records);
        prop_assert!(evaluate_activity(&records, &params).is_empty());
    }
}
