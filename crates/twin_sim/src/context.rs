//! Per-run mutable state.
//!
//! A [`RunContext`] is created fresh for every `simulate` call and consumed
//! into the [`RunResult`]; nothing run-scoped lives on the engine.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use twin_model::{BlastRadius, Finding, Metrics, Node, RunResult, RunStatus, SimEvent};
use twin_policy::Policy;
use xxhash_rust::xxh64::xxh64;

/// Seed for run and finding identifiers.
const ID_SEED: u64 = 0x7477_696e;

/// Traffic counters accumulated during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub packets_processed: u64,
    pub packets_dropped: u64,
    pub policies_evaluated: u64,
    pub policies_blocked: u64,
}

impl Counters {
    pub(crate) fn apply(self, metrics: &mut Metrics) {
        metrics.packets_processed = self.packets_processed;
        metrics.packets_dropped = self.packets_dropped;
        metrics.policies_evaluated = self.policies_evaluated;
        metrics.policies_blocked = self.policies_blocked;
    }
}

pub(crate) struct RunContext {
    run_id: String,
    scenario_id: String,
    started_at: DateTime<Utc>,
    clock: u64,
    events: Vec<SimEvent>,
    findings: Vec<Finding>,
    pub counters: Counters,
    policies: HashMap<String, Policy>,
}

impl RunContext {
    pub(crate) fn new(scenario_id: &str) -> Self {
        let started_at = Utc::now();
        let seed = format!("{scenario_id}@{}", started_at.to_rfc3339());
        Self {
            run_id: format!("{:016x}", xxh64(seed.as_bytes(), ID_SEED)),
            scenario_id: scenario_id.to_string(),
            started_at,
            clock: 0,
            events: Vec::new(),
            findings: Vec::new(),
            counters: Counters::default(),
            policies: HashMap::new(),
        }
    }

    pub(crate) fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current simulation time in milliseconds.
    pub(crate) const fn now(&self) -> u64 {
        self.clock
    }

    /// Moves the clock forward, pinning at `u64::MAX`.
    pub(crate) fn advance(&mut self, ms: u64) {
        self.clock = self.clock.saturating_add(ms);
    }

    pub(crate) fn record(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Stamps a deterministic id and the run start time onto `finding`.
    pub(crate) fn push_finding(&mut self, mut finding: Finding) {
        let key = format!(
            "{}#{}#{}#{}",
            self.run_id,
            self.findings.len(),
            finding.title,
            finding.description
        );
        finding.id = format!("{:016x}", xxh64(key.as_bytes(), ID_SEED));
        finding.created_at = self.started_at;
        self.findings.push(finding);
    }

    /// Returns the parsed policy of `firewall`, parsing it on first use.
    ///
    /// An empty `policy` property counts as missing.
    pub(crate) fn policy_for(&mut self, firewall: &Node, fallback: &str) -> &Policy {
        self.policies.entry(firewall.id.clone()).or_insert_with(|| {
            let source = firewall
                .property_str("policy")
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback);
            twin_policy::parse(source)
        })
    }

    pub(crate) fn finish(
        self,
        status: RunStatus,
        mut metrics: Metrics,
        blast_radius: Option<BlastRadius>,
    ) -> RunResult {
        self.counters.apply(&mut metrics);
        RunResult {
            id: self.run_id,
            scenario_id: self.scenario_id,
            status,
            started_at: self.started_at,
            finished_at: Some(Utc::now()),
            events: self.events,
            metrics,
            findings: self.findings,
            blast_radius,
        }
    }
}
