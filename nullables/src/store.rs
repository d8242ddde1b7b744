//! Nullable store: thread-safe in-memory storage for testing.
//!
//! All state sits behind one mutex so that a snapshot and a versioned commit
//! each observe a single consistent view.

use doctrine_store::{
    OrganizationStore, ProposalStore, SnapshotVersion, StoreError, TallySnapshot, TallyStore,
    VoteStore,
};
use doctrine_types::{
    MemberId, MemberRecord, OrganizationRecords, Proposal, ProposalId, ProvinceRecord,
    SquadRecord, TeamRecord, UnionRecord, VoteRecord,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    organization: OrganizationRecords,
    organization_version: u64,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<ProposalId, BTreeMap<MemberId, VoteRecord>>,
    ballot_versions: HashMap<ProposalId, u64>,
    proposal_versions: HashMap<ProposalId, u64>,
}

impl State {
    fn version(&self, proposal: ProposalId) -> SnapshotVersion {
        SnapshotVersion {
            organization: self.organization_version,
            ballots: self.ballot_versions.get(&proposal).copied().unwrap_or(0),
            proposal: self.proposal_versions.get(&proposal).copied().unwrap_or(0),
        }
    }

    fn touch_organization(&mut self) {
        self.organization_version += 1;
    }

    /// Refuse writes to a missing or terminal proposal.
    fn ensure_open(&self, proposal: ProposalId) -> Result<(), StoreError> {
        let record = self
            .proposals
            .get(&proposal)
            .ok_or_else(|| StoreError::NotFound(proposal.to_string()))?;
        if record.status.is_terminal() {
            return Err(StoreError::Closed {
                proposal,
                status: record.status,
            });
        }
        Ok(())
    }
}

/// An in-memory [`TallyStore`] for testing.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    /// Upcoming commits to fail as if another writer got there first.
    injected_conflicts: AtomicU32,
    commits: AtomicU32,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with organisation records.
    pub fn with_organization(records: OrganizationRecords) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().organization = records;
        store
    }

    /// Make the next `count` calls to `commit_tally` fail with a conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of successful `commit_tally` calls so far.
    pub fn commit_count(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn upsert<T, K: PartialEq>(rows: &mut Vec<T>, row: T, key: impl Fn(&T) -> K) {
    let k = key(&row);
    match rows.iter_mut().find(|r| key(r) == k) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

impl OrganizationStore for NullStore {
    fn organization(&self) -> Result<OrganizationRecords, StoreError> {
        Ok(self.state.lock().unwrap().organization.clone())
    }

    fn put_organization(&self, records: &OrganizationRecords) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.organization = records.clone();
        state.touch_organization();
        Ok(())
    }

    fn get_member(&self, id: MemberId) -> Result<MemberRecord, StoreError> {
        self.state
            .lock()
            .unwrap()
            .organization
            .members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_member(&self, member: &MemberRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        upsert(&mut state.organization.members, member.clone(), |m| m.id);
        state.touch_organization();
        Ok(())
    }

    fn set_delegate(&self, member: MemberId, delegate: Option<MemberId>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .organization
            .member_mut(member)
            .ok_or_else(|| StoreError::NotFound(member.to_string()))?;
        record.delegate = delegate;
        state.touch_organization();
        Ok(())
    }

    fn put_team(&self, team: &TeamRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        upsert(&mut state.organization.teams, team.clone(), |t| t.id);
        state.touch_organization();
        Ok(())
    }

    fn put_squad(&self, squad: &SquadRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        upsert(&mut state.organization.squads, squad.clone(), |s| s.id);
        state.touch_organization();
        Ok(())
    }

    fn put_union(&self, union: &UnionRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        upsert(&mut state.organization.unions, union.clone(), |u| u.id);
        state.touch_organization();
        Ok(())
    }

    fn put_province(&self, province: &ProvinceRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        upsert(&mut state.organization.provinces, province.clone(), |p| p.id);
        state.touch_organization();
        Ok(())
    }
}

impl ProposalStore for NullStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Proposal, StoreError> {
        self.state
            .lock()
            .unwrap()
            .proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn insert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.proposals.contains_key(&proposal.id) {
            return Err(StoreError::Duplicate(proposal.id.to_string()));
        }
        state.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    fn iter_proposals(&self) -> Result<Vec<Proposal>, StoreError> {
        Ok(self.state.lock().unwrap().proposals.values().cloned().collect())
    }
}

impl VoteStore for NullStore {
    fn get_vote(
        &self,
        proposal: ProposalId,
        member: MemberId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .votes
            .get(&proposal)
            .and_then(|votes| votes.get(&member))
            .cloned())
    }

    fn put_vote(&self, vote: &VoteRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.ensure_open(vote.proposal)?;
        state
            .votes
            .entry(vote.proposal)
            .or_default()
            .insert(vote.member, vote.clone());
        *state.ballot_versions.entry(vote.proposal).or_default() += 1;
        Ok(())
    }

    fn votes_for(&self, proposal: ProposalId) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .votes
            .get(&proposal)
            .map(|votes| votes.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl TallyStore for NullStore {
    fn snapshot(&self, proposal: ProposalId) -> Result<TallySnapshot, StoreError> {
        let state = self.state.lock().unwrap();
        let record = state
            .proposals
            .get(&proposal)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(proposal.to_string()))?;
        let votes = state
            .votes
            .get(&proposal)
            .map(|votes| votes.values().cloned().collect())
            .unwrap_or_default();
        Ok(TallySnapshot {
            proposal: record,
            organization: state.organization.clone(),
            votes,
            version: state.version(proposal),
        })
    }

    fn commit_tally(&self, expected: SnapshotVersion, proposal: &Proposal) -> Result<(), StoreError> {
        if self.take_injected_conflict() {
            tracing::debug!(proposal = %proposal.id, "injected commit conflict");
            return Err(StoreError::Conflict(format!(
                "{} changed after snapshot {expected}",
                proposal.id
            )));
        }
        let mut state = self.state.lock().unwrap();
        state.ensure_open(proposal.id)?;
        let current = state.version(proposal.id);
        if current != expected {
            return Err(StoreError::Conflict(format!(
                "{} is at {current}, snapshot was {expected}",
                proposal.id
            )));
        }
        state.proposals.insert(proposal.id, proposal.clone());
        *state.proposal_versions.entry(proposal.id).or_default() += 1;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
