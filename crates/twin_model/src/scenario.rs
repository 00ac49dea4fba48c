//! Scenario model: flows, faults and attack events.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A simulation scenario run against one topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Unique scenario identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Topology the scenario targets.
    pub topology_id: String,
    /// Traffic intents.
    #[serde(default)]
    pub flows: Vec<Flow>,
    /// Topology perturbations, applied in order.
    #[serde(default)]
    pub faults: Vec<Fault>,
    /// Adversarial actions.
    #[serde(default)]
    pub attack_events: Vec<AttackEvent>,
    /// Simulated duration in milliseconds.
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Free-form options for collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// A traffic intent between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Unique flow identifier.
    pub id: String,
    /// Originating node id.
    pub from: String,
    /// Destination node id.
    pub to: String,
    /// Protocol name (`tcp`, `udp`, `icmp`, ...).
    pub protocol: String,
    /// Destination port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Packets per second. Descriptive only.
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A topology perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    /// Unique fault identifier.
    pub id: String,
    /// Kind of perturbation.
    #[serde(rename = "type")]
    pub kind: FaultKind,
    /// Link id or node id, depending on `kind`.
    pub target_id: String,
    /// Simulation time of injection in milliseconds.
    #[serde(default)]
    pub start_time: u64,
    /// Duration in milliseconds; unset means permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Parameters for degradation faults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<FaultParams>,
}

/// Kind of fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    /// Link stops carrying traffic.
    LinkDown,
    /// Link characteristics are overwritten.
    LinkDegraded,
    /// Every link touching the node goes down.
    NodeDown,
}

/// Overrides applied by a `link-degraded` fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultParams {
    /// New latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    /// New loss percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

/// A modeled adversarial action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackEvent {
    /// Unique event identifier.
    pub id: String,
    /// Kind of attack.
    #[serde(rename = "type")]
    pub kind: AttackKind,
    /// Node the attack starts from.
    pub source_node_id: String,
    /// Node the attack is aimed at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    /// Simulation time in milliseconds.
    pub timestamp: u64,
    /// Free-form attributes passed through to the event log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Kind of attack event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttackKind {
    /// Reuse of stolen credentials.
    CredentialReuse,
    /// Host compromised through phishing.
    PhishingCompromise,
    /// Pivot between internal hosts.
    LateralMovement,
    /// Attempt to move data out.
    DataExfilAttempt,
    /// Local privilege escalation.
    PrivilegeEscalation,
    /// Reconnaissance scan.
    ReconScan,
}

const fn default_duration() -> u64 {
    60_000
}

const fn default_rate() -> f64 {
    1.0
}

impl FaultKind {
    /// Wire name of the fault kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkDown => "link-down",
            Self::LinkDegraded => "link-degraded",
            Self::NodeDown => "node-down",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AttackKind {
    /// Wire name of the attack kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CredentialReuse => "credential-reuse",
            Self::PhishingCompromise => "phishing-compromise",
            Self::LateralMovement => "lateral-movement",
            Self::DataExfilAttempt => "data-exfil-attempt",
            Self::PrivilegeEscalation => "privilege-escalation",
            Self::ReconScan => "recon-scan",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Scenario {
    /// Creates an empty scenario for a topology.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, topology_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            topology_id: topology_id.into(),
            flows: Vec::new(),
            faults: Vec::new(),
            attack_events: Vec::new(),
            duration: default_duration(),
            options: None,
        }
    }

    /// Appends a flow.
    #[must_use]
    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flows.push(flow);
        self
    }

    /// Appends a fault.
    #[must_use]
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Appends an attack event.
    #[must_use]
    pub fn with_attack(mut self, event: AttackEvent) -> Self {
        self.attack_events.push(event);
        self
    }

    /// Checks schema-level constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] on the first violation found.
    pub fn check_schema(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::schema("scenario id must not be empty"));
        }
        for flow in &self.flows {
            if flow.from.is_empty() || flow.to.is_empty() {
                return Err(Error::schema(format!(
                    "flow {}: endpoints must not be empty",
                    flow.id
                )));
            }
        }
        for fault in &self.faults {
            if fault.target_id.is_empty() {
                return Err(Error::schema(format!(
                    "fault {}: targetId must not be empty",
                    fault.id
                )));
            }
            if let Some(loss) = fault.params.and_then(|p| p.loss) {
                if !(0.0..=100.0).contains(&loss) {
                    return Err(Error::schema(format!(
                        "fault {}: loss {loss} outside 0-100",
                        fault.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Flow {
    /// Creates a flow with default rate.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            protocol: protocol.into(),
            port: None,
            rate: default_rate(),
            label: None,
        }
    }

    /// Sets the destination port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

impl Fault {
    /// Creates a permanent fault injected at time zero.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: FaultKind, target_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target_id: target_id.into(),
            start_time: 0,
            duration: None,
            params: None,
        }
    }

    /// Sets degradation parameters.
    #[must_use]
    pub const fn with_params(mut self, params: FaultParams) -> Self {
        self.params = Some(params);
        self
    }
}

impl AttackEvent {
    /// Creates an attack event at time zero.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: AttackKind, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source_node_id: source.into(),
            target_node_id: None,
            timestamp: 0,
            metadata: None,
        }
    }

    /// Sets the target node.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_node_id = Some(target.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scenario_deserializes_with_defaults() {
        let scenario: Scenario = serde_json::from_value(json!({
            "id": "sc1",
            "name": "Baseline",
            "topologyId": "t1"
        }))
        .unwrap();

        assert!(scenario.flows.is_empty());
        assert!(scenario.faults.is_empty());
        assert!(scenario.attack_events.is_empty());
        assert_eq!(scenario.duration, 60_000);
    }

    #[test]
    fn fault_wire_format() {
        let fault: Fault = serde_json::from_value(json!({
            "id": "f1",
            "type": "link-degraded",
            "targetId": "l1",
            "params": { "latency": 250.0 }
        }))
        .unwrap();

        assert_eq!(fault.kind, FaultKind::LinkDegraded);
        assert_eq!(fault.start_time, 0);
        assert_eq!(fault.params.unwrap().latency, Some(250.0));
        assert_eq!(fault.params.unwrap().loss, None);
    }

    #[test]
    fn attack_kind_names() {
        let event: AttackEvent = serde_json::from_value(json!({
            "id": "a1",
            "type": "data-exfil-attempt",
            "sourceNodeId": "laptop",
            "timestamp": 500
        }))
        .unwrap();
        assert_eq!(event.kind, AttackKind::DataExfilAttempt);
        assert_eq!(event.kind.to_string(), "data-exfil-attempt");
        assert!(event.target_node_id.is_none());
    }

    #[test]
    fn schema_rejects_bad_degradation_loss() {
        let scenario = Scenario::new("sc", "bad", "t").with_fault(
            Fault::new("f1", FaultKind::LinkDegraded, "l1").with_params(FaultParams {
                latency: None,
                loss: Some(101.0),
            }),
        );
        assert!(matches!(scenario.check_schema(), Err(Error::Schema(_))));
    }

    #[test]
    fn flow_port_is_optional() {
        let flow: Flow = serde_json::from_value(json!({
            "id": "f", "from": "a", "to": "b", "protocol": "icmp"
        }))
        .unwrap();
        assert_eq!(flow.port, None);
        assert!((flow.rate - 1.0).abs() < f64::EPSILON);
    }
}
