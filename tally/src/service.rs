//! The tally service: snapshot, aggregate, decide, commit.
//!
//! Every read works on one consistent [`TallySnapshot`]. Finalizing commits
//! against the snapshot's version; if a vote or organisation change landed
//! in between, the whole aggregation is redone on a fresh snapshot.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;

use doctrine_governance::{
    aggregate, breakdown, decide, prepare_vote, Aggregation, Ballots, DelegationEngine,
    GovernanceError, VoteBreakdown,
};
use doctrine_organization::{evaluate_activity, ActivityReport, Hierarchy, HierarchyBuilder};
use doctrine_store::{StoreError, TallySnapshot, TallyStore};
use doctrine_types::{
    ArticleTier, CachedTally, Clock, GovernanceParams, MemberId, Outcome, Proposal, ProposalId,
    ProposalKind, ProposalStatus, Timestamp, VoteChoice, VoteRecord,
};
use doctrine_utils::format_duration;

use crate::config::TallyConfig;
use crate::metrics::TallyMetrics;
use crate::TallyError;

/// Outcome of one proposal in an expiry sweep.
pub type SweepResult = (ProposalId, Result<Outcome, TallyError>);

pub struct TallyService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    params: GovernanceParams,
    max_commit_retries: u32,
    pool: Option<ThreadPool>,
    metrics: TallyMetrics,
}

/// A snapshot indexed for tabulation.
struct Prepared {
    snapshot: TallySnapshot,
    hierarchy: Hierarchy,
    ballots: Ballots,
}

impl<S: TallyStore + Send + Sync> TallyService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: &TallyConfig) -> Result<Self, TallyError> {
        config.validate()?;
        let pool = match config.sweep_threads {
            0 => None,
            n => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("tally-sweep-{i}"))
                    .build()
                    .map_err(|e| TallyError::ThreadPool(e.to_string()))?,
            ),
        };
        Ok(Self {
            store,
            clock,
            params: config.governance.clone(),
            max_commit_retries: config.max_commit_retries,
            pool,
            metrics: TallyMetrics::new()?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn metrics(&self) -> &TallyMetrics {
        &self.metrics
    }

    fn prepare(&self, proposal: ProposalId) -> Result<Prepared, TallyError> {
        let snapshot = self.store.snapshot(proposal)?;
        let hierarchy = HierarchyBuilder::from_records(snapshot.organization.clone()).build()?;
        let ballots = Ballots::from_records(proposal, snapshot.votes.iter().cloned());
        self.metrics.members.set(hierarchy.member_count() as i64);
        Ok(Prepared {
            snapshot,
            hierarchy,
            ballots,
        })
    }

    fn hierarchy(&self) -> Result<Hierarchy, TallyError> {
        Ok(HierarchyBuilder::from_records(self.store.organization()?).build()?)
    }

    /// Create and store a proposal whose voting window opens now.
    pub fn open_proposal(
        &self,
        id: ProposalId,
        kind: ProposalKind,
        target_tier: ArticleTier,
    ) -> Result<Proposal, TallyError> {
        let proposal = Proposal::open(
            id,
            kind,
            target_tier,
            self.clock.now(),
            self.params.voting_window_secs,
        );
        self.store.insert_proposal(&proposal)?;
        tracing::info!(
            proposal = %id,
            ?kind,
            ?target_tier,
            window = %format_duration(self.params.voting_window_secs),
            "proposal opened"
        );
        Ok(proposal)
    }

    /// Live tally. Refreshes the cached counters of an active proposal but
    /// never changes its status.
    pub fn aggregate(&self, proposal: ProposalId) -> Result<Aggregation, TallyError> {
        let prepared = self.prepare(proposal)?;
        let agg = aggregate(&prepared.hierarchy, &prepared.ballots, &self.params);

        let mut record = prepared.snapshot.proposal;
        if record.status == ProposalStatus::Active {
            record.cached = CachedTally {
                yes: agg.tally.yes,
                abstain: agg.tally.abstain,
                veto: agg.tally.veto,
            };
            match self.store.commit_tally(prepared.snapshot.version, &record) {
                Ok(()) => {}
                // A newer write will be reflected by the next read.
                Err(StoreError::Conflict(reason)) => {
                    tracing::debug!(proposal = %proposal, %reason, "cached tally not refreshed");
                }
                // Finalized in between; the recorded outcome stands.
                Err(StoreError::Closed { status, .. }) => {
                    tracing::debug!(proposal = %proposal, %status, "closed before cached tally was refreshed");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(agg)
    }

    /// Per-source counts and multiplier bonus for display.
    pub fn breakdown(&self, proposal: ProposalId) -> Result<VoteBreakdown, TallyError> {
        let prepared = self.prepare(proposal)?;
        Ok(breakdown(&prepared.hierarchy, &prepared.ballots, &self.params))
    }

    /// [`TallyService::breakdown`] as pretty-printed JSON.
    pub fn breakdown_json(&self, proposal: ProposalId) -> Result<String, TallyError> {
        Ok(serde_json::to_string_pretty(&self.breakdown(proposal)?)?)
    }

    /// Decide a proposal and record the outcome.
    ///
    /// A proposal that is already terminal is left alone and its recorded
    /// outcome returned.
    pub fn finalize(&self, proposal: ProposalId) -> Result<Outcome, TallyError> {
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let prepared = self.prepare(proposal)?;
            let mut record = prepared.snapshot.proposal;
            if record.status.is_terminal() {
                tracing::debug!(proposal = %proposal, status = %record.status, "already finalized");
                return record.outcome.ok_or(TallyError::MissingOutcome(proposal));
            }

            let agg = aggregate(&prepared.hierarchy, &prepared.ballots, &self.params);
            let outcome = decide(
                &agg,
                prepared.hierarchy.member_count() as u64,
                record.target_tier,
                &self.params,
            );
            record.conclude(outcome.clone())?;

            match self.store.commit_tally(prepared.snapshot.version, &record) {
                Ok(()) => {
                    self.record_outcome(&outcome, &agg, started);
                    tracing::info!(
                        proposal = %proposal,
                        status = %outcome.status,
                        yes = outcome.yes_votes,
                        veto = outcome.veto_votes,
                        members = outcome.total_members,
                        yes_pct = format!("{:.2}", outcome.yes_percentage),
                        threshold = outcome.threshold_pct,
                        attempts,
                        "proposal finalized"
                    );
                    return Ok(outcome);
                }
                Err(StoreError::Conflict(reason)) => {
                    self.metrics.commit_conflicts.inc();
                    if attempts > self.max_commit_retries {
                        tracing::warn!(proposal = %proposal, attempts, %reason, "giving up on finalize");
                        return Err(TallyError::RetriesExhausted { proposal, attempts });
                    }
                    tracing::warn!(proposal = %proposal, attempts, %reason, "snapshot went stale, retrying");
                }
                // Someone else finalized first; the next read returns their outcome.
                Err(StoreError::Closed { status, .. }) => {
                    tracing::debug!(proposal = %proposal, %status, "finalized concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn record_outcome(&self, outcome: &Outcome, agg: &Aggregation, started: Instant) {
        self.metrics.finalized.inc();
        match outcome.status {
            ProposalStatus::Passed => self.metrics.passed.inc(),
            ProposalStatus::Rejected => self.metrics.rejected.inc(),
            ProposalStatus::Archived => self.metrics.archived.inc(),
            ProposalStatus::Active => {}
        }
        self.metrics
            .multipliers_applied
            .inc_by(agg.multipliers.len() as u64);
        self.metrics
            .finalize_time_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
    }

    /// Finalize every active proposal whose window has closed at `now`,
    /// in parallel. One failing proposal does not stop the others.
    pub fn finalize_expired(&self, now: Timestamp) -> Result<Vec<SweepResult>, TallyError> {
        let expired = self.store.expired_active_proposals(now)?;
        if expired.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(count = expired.len(), %now, "sweeping expired proposals");

        let run = || -> Vec<SweepResult> {
            expired
                .par_iter()
                .map(|&id| {
                    tracing::debug!(proposal = %id, "finalizing expired proposal");
                    (id, self.finalize(id))
                })
                .collect()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        for (id, result) in &results {
            if let Err(e) = result {
                tracing::warn!(proposal = %id, error = %e, "expired proposal not finalized");
            }
        }
        Ok(results)
    }

    /// Cast or change a direct vote at the current time.
    pub fn cast_vote(
        &self,
        proposal: ProposalId,
        member: MemberId,
        choice: VoteChoice,
    ) -> Result<VoteRecord, TallyError> {
        let now = self.clock.now();
        let record = self.store.get_proposal(proposal)?;
        let hierarchy = self.hierarchy()?;
        let previous = self.store.get_vote(proposal, member)?;
        let vote = prepare_vote(
            &record,
            &hierarchy,
            previous.as_ref(),
            member,
            choice,
            now,
            &self.params,
        )?;
        if previous.as_ref() != Some(&vote) {
            self.store.put_vote(&vote)?;
            self.metrics.votes_cast.inc();
            tracing::debug!(proposal = %proposal, %member, %choice, "vote stored");
        }
        Ok(vote)
    }

    /// Entrust `member`'s vote to `delegate`.
    ///
    /// Cycles are allowed; they only mean the delegation yields no vote.
    pub fn set_delegate(&self, member: MemberId, delegate: MemberId) -> Result<(), TallyError> {
        let hierarchy = self.hierarchy()?;
        for id in [member, delegate] {
            if hierarchy.member(id).is_none() {
                return Err(GovernanceError::MemberNotFound(id).into());
            }
        }
        let mut engine = DelegationEngine::from_hierarchy(&hierarchy);
        engine.delegate(member, delegate)?;
        if engine.chain(member).cyclic {
            tracing::warn!(%member, %delegate, "delegation closes a cycle");
        }
        self.store.set_delegate(member, Some(delegate))?;
        tracing::debug!(%member, %delegate, "delegate set");
        Ok(())
    }

    /// Remove `member`'s delegation. Returns the previous delegate.
    pub fn clear_delegate(&self, member: MemberId) -> Result<Option<MemberId>, TallyError> {
        let previous = self.store.get_member(member)?.delegate;
        if previous.is_some() {
            self.store.set_delegate(member, None)?;
            tracing::debug!(%member, "delegate cleared");
        }
        Ok(previous)
    }

    /// Switch off units that fell below their minimum size and store the
    /// updated flags.
    pub fn refresh_activity(&self) -> Result<ActivityReport, TallyError> {
        let mut records = self.store.organization()?;
        let report = evaluate_activity(&records, &self.params);
        if !report.is_empty() {
            report.apply(&mut records);
            self.store.put_organization(&records)?;
        }
        Ok(report)
    }
}
