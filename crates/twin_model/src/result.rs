//! Run output: events, metrics, findings and the run result.

use crate::graph::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Source node id to destination node id to reachability.
pub type ReachabilityMatrix = BTreeMap<String, BTreeMap<String, bool>>;

/// Source node id to destination node id to path latency in milliseconds.
/// Unreachable pairs hold `f64::INFINITY`.
pub type LatencyMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Terminal output of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Run identifier.
    pub id: String,
    /// Scenario that was simulated.
    pub scenario_id: String,
    /// Outcome.
    pub status: RunStatus,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock finish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Events in emission order.
    pub events: Vec<SimEvent>,
    /// Aggregate metrics.
    pub metrics: Metrics,
    /// Findings in emission order.
    pub findings: Vec<Finding>,
    /// Blast-radius report, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blast_radius: Option<BlastRadius>,
}

/// Run lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// In progress. Never returned by the engine.
    Running,
    /// Finished normally.
    Completed,
    /// Aborted by topology validation.
    Failed,
}

/// A timestamped simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimEvent {
    /// Simulation time in milliseconds.
    pub timestamp: u64,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: SimEventKind,
    /// Node involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Link involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    /// Flow involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Kind of simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimEventKind {
    /// A flow begins.
    FlowStart,
    /// A flow was delivered.
    FlowEnd,
    /// A packet passed a node.
    PacketSent,
    /// A packet arrived.
    PacketReceived,
    /// A packet could not be delivered.
    PacketDropped,
    /// A fault was applied (also used for validation failure).
    FaultInjected,
    /// A fault ended.
    FaultResolved,
    /// A firewall denied a flow.
    PolicyBlock,
    /// An attack event was evaluated.
    AttackEvent,
}

/// Aggregate metrics of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// All-pairs reachability.
    pub reachability_matrix: ReachabilityMatrix,
    /// All-pairs path latency. Infinite entries serialize as `null`.
    #[serde(with = "latency_serde")]
    pub latency_matrix: LatencyMatrix,
    /// Flows delivered.
    pub packets_processed: u64,
    /// Flows dropped (unreachable or blocked).
    pub packets_dropped: u64,
    /// Firewall evaluations performed.
    pub policies_evaluated: u64,
    /// Firewall evaluations that denied.
    pub policies_blocked: u64,
}

/// A severity-ranked observation produced by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Finding identifier.
    pub id: String,
    /// Run the finding belongs to, attached by persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Severity.
    pub severity: Severity,
    /// Short title.
    pub title: String,
    /// Explanation.
    pub description: String,
    /// Nodes involved.
    #[serde(default)]
    pub affected_node_ids: Vec<String>,
    /// Links involved.
    #[serde(default)]
    pub affected_link_ids: Vec<String>,
    /// Supporting data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
    /// Suggested fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    /// Grouping category (`security`, `access-control`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Impact of compromising a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastRadius {
    /// The compromised node.
    pub compromised_node_id: String,
    /// The compromised node followed by its direct neighbours.
    pub affected_node_ids: Vec<String>,
    /// Links touching the compromised node.
    pub affected_link_ids: Vec<String>,
    /// Weighted impact score.
    pub impact_score: u64,
}

impl RunResult {
    /// Returns true if the run completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Returns findings at or above the given severity.
    pub fn findings_at_least(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |f| f.severity.at_least(severity))
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_events(&self, kind: SimEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

impl SimEventKind {
    /// Wire name of the event kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlowStart => "flow-start",
            Self::FlowEnd => "flow-end",
            Self::PacketSent => "packet-sent",
            Self::PacketReceived => "packet-received",
            Self::PacketDropped => "packet-dropped",
            Self::FaultInjected => "fault-injected",
            Self::FaultResolved => "fault-resolved",
            Self::PolicyBlock => "policy-block",
            Self::AttackEvent => "attack-event",
        }
    }
}

impl fmt::Display for SimEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl SimEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(timestamp: u64, kind: SimEventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind,
            node_id: None,
            link_id: None,
            flow_id: None,
            message: message.into(),
            metadata: None,
        }
    }

    /// Sets the node.
    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Sets the flow.
    #[must_use]
    pub fn with_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<Map<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Finding {
    /// Creates a finding with no affected elements.
    ///
    /// The id is empty and the creation time is now; the engine stamps both
    /// when it records the finding.
    #[must_use]
    pub fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            run_id: None,
            severity,
            title: title.into(),
            description: description.into(),
            affected_node_ids: Vec::new(),
            affected_link_ids: Vec::new(),
            evidence: None,
            remediation: None,
            category: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the affected nodes.
    #[must_use]
    pub fn with_nodes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_node_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the affected links.
    #[must_use]
    pub fn with_links<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_link_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the remediation text.
    #[must_use]
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Sets the evidence.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// Serializes infinite latencies as `null` and reads `null` back as infinity.
mod latency_serde {
    use super::LatencyMatrix;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        matrix: &LatencyMatrix,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut outer = serializer.serialize_map(Some(matrix.len()))?;
        for (source, row) in matrix {
            let row: BTreeMap<&str, Option<f64>> = row
                .iter()
                .map(|(target, ms)| (target.as_str(), ms.is_finite().then_some(*ms)))
                .collect();
            outer.serialize_entry(source, &row)?;
        }
        outer.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<LatencyMatrix, D::Error> {
        let raw = BTreeMap::<String, BTreeMap<String, Option<f64>>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(source, row)| {
                let row = row
                    .into_iter()
                    .map(|(target, ms)| (target, ms.unwrap_or(f64::INFINITY)))
                    .collect();
                (source, row)
            })
            .collect())
    }
}
