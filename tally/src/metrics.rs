//! Prometheus metrics for the tally service.
//!
//! [`TallyMetrics`] owns a dedicated [`Registry`] that an embedding
//! application can encode into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

pub struct TallyMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Proposals moved into a terminal status.
    pub finalized: IntCounter,
    pub passed: IntCounter,
    pub rejected: IntCounter,
    pub archived: IntCounter,
    /// Commits refused because votes or organisation changed after the snapshot.
    pub commit_conflicts: IntCounter,
    /// Multipliers applied across all aggregations.
    pub multipliers_applied: IntCounter,
    /// Direct votes stored.
    pub votes_cast: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Members in the most recent snapshot.
    pub members: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time from snapshot to commit for one finalize, in milliseconds.
    pub finalize_time_ms: Histogram,
}

impl TallyMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let finalized = register_int_counter_with_registry!(
            Opts::new(
                "doctrine_proposals_finalized_total",
                "Proposals moved into a terminal status"
            ),
            registry
        )?;
        let passed = register_int_counter_with_registry!(
            Opts::new("doctrine_proposals_passed_total", "Proposals passed"),
            registry
        )?;
        let rejected = register_int_counter_with_registry!(
            Opts::new("doctrine_proposals_rejected_total", "Proposals rejected"),
            registry
        )?;
        let archived = register_int_counter_with_registry!(
            Opts::new(
                "doctrine_proposals_archived_total",
                "Proposals archived without votes"
            ),
            registry
        )?;
        let commit_conflicts = register_int_counter_with_registry!(
            Opts::new(
                "doctrine_commit_conflicts_total",
                "Tally commits retried after a concurrent change"
            ),
            registry
        )?;
        let multipliers_applied = register_int_counter_with_registry!(
            Opts::new(
                "doctrine_multipliers_applied_total",
                "Unit multipliers applied while finalizing"
            ),
            registry
        )?;
        let votes_cast = register_int_counter_with_registry!(
            Opts::new("doctrine_votes_cast_total", "Direct votes stored"),
            registry
        )?;

        let members = register_int_gauge_with_registry!(
            Opts::new("doctrine_members", "Members in the latest snapshot"),
            registry
        )?;

        // 0.1 ms → ~1.6 s
        let finalize_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "doctrine_finalize_time_ms",
                "Finalize time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            finalized,
            passed,
            rejected,
            archived,
            commit_conflicts,
            multipliers_applied,
            votes_cast,
            members,
            finalize_time_ms,
        })
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
