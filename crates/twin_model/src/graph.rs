//! Topology model: nodes, links and graphs.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A network topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Nodes in declaration order.
    pub nodes: Vec<Node>,
    /// Links in declaration order. Order drives routing tie-breaks.
    pub links: Vec<Link>,
    /// Descriptive metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
}

/// Descriptive graph metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    /// Topology name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time as supplied by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update time as supplied by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A device in the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique node identifier.
    pub id: String,
    /// Device kind.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display label.
    pub label: String,
    /// Functional role (e.g. `admin`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Operating system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Software or firmware version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Group tags, used by policy references.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Business criticality of the node.
    #[serde(default)]
    pub risk_criticality: Severity,
    /// Network interfaces.
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    /// Free-form properties (`policy`, `tls`, `https`, ...).
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
}

/// Device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Layer-3 router.
    Router,
    /// Layer-2 switch.
    Switch,
    /// Policy enforcement point.
    Firewall,
    /// Modem.
    Modem,
    /// Server.
    Server,
    /// Workstation.
    Workstation,
    /// Mobile device.
    Mobile,
    /// IoT device.
    Iot,
    /// Tactical data link terminal.
    Tdl,
    /// Adversary-controlled device.
    HackingDevice,
    /// Cloud-hosted service.
    CloudService,
}

/// A network interface on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// Interface identifier.
    pub id: String,
    /// Interface name.
    pub name: String,
    /// IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Subnet in CIDR or mask form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    /// MAC address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Administrative state.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// A bidirectional connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Unique link identifier.
    pub id: String,
    /// First endpoint node id.
    pub source: String,
    /// Second endpoint node id.
    pub target: String,
    /// Medium.
    #[serde(rename = "type")]
    pub link_type: LinkType,
    /// Capacity in Mbps. Descriptive only.
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    /// One-way latency in milliseconds.
    #[serde(default)]
    pub latency: f64,
    /// Loss percentage (0-100). Descriptive only.
    #[serde(default)]
    pub loss: f64,
    /// Jitter in milliseconds. Descriptive only.
    #[serde(default)]
    pub jitter: f64,
    /// Whether the link is expected to fail.
    #[serde(default)]
    pub can_fail: bool,
    /// Whether the link is down. Set by fault injection.
    #[serde(default)]
    pub failed: bool,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Link medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    /// Wired Ethernet.
    Ethernet,
    /// Wireless LAN.
    Wifi,
    /// Wide-area link.
    Wan,
    /// VPN tunnel.
    Vpn,
    /// Serial line.
    Serial,
    /// Tactical data link.
    Tdl,
}

/// Severity level shared by findings and node criticality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Immediate action required.
    Critical,
    /// Serious weakness.
    High,
    /// Notable weakness.
    #[default]
    Medium,
    /// Minor issue.
    Low,
    /// Informational only.
    Info,
}

const fn default_true() -> bool {
    true
}

const fn default_bandwidth() -> f64 {
    1000.0
}

impl Severity {
    /// Numeric rank, higher is more severe.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Info => 0,
        }
    }

    /// Returns true if `self` is at least as severe as `other`.
    #[must_use]
    pub const fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "info" => Ok(Self::Info),
            other => Err(Error::schema(format!("unknown severity: {other}"))),
        }
    }
}

impl Node {
    /// Creates a node with default criticality and no tags.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            role: None,
            os: None,
            version: None,
            tags: Vec::new(),
            risk_criticality: Severity::default(),
            interfaces: Vec::new(),
            properties: Map::new(),
            position: Position::default(),
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the criticality.
    #[must_use]
    pub const fn with_criticality(mut self, severity: Severity) -> Self {
        self.risk_criticality = severity;
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns true if the node carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns true if this node enforces policy.
    #[must_use]
    pub fn is_firewall(&self) -> bool {
        self.node_type == NodeType::Firewall
    }

    /// Returns a string property, if present and a string.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Returns true if the property exists and is truthy: `true`, a non-zero
    /// number, a non-empty string, or any array/object.
    #[must_use]
    pub fn property_truthy(&self, key: &str) -> bool {
        match self.properties.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_) | Value::Object(_)) => true,
        }
    }
}

impl Link {
    /// Creates an Ethernet link with default characteristics.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            link_type: LinkType::Ethernet,
            bandwidth: default_bandwidth(),
            latency: 0.0,
            loss: 0.0,
            jitter: 0.0,
            can_fail: false,
            failed: false,
            label: None,
        }
    }

    /// Sets the latency in milliseconds.
    #[must_use]
    pub const fn with_latency(mut self, latency: f64) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the link type.
    #[must_use]
    pub const fn with_type(mut self, link_type: LinkType) -> Self {
        self.link_type = link_type;
        self
    }

    /// Returns true if either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Returns the endpoint opposite `node_id`.
    #[must_use]
    pub fn other_end(&self, node_id: &str) -> &str {
        if self.source == node_id {
            &self.target
        } else {
            &self.source
        }
    }

    fn check_schema(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::schema("link id must not be empty"));
        }
        if !(0.0..=100.0).contains(&self.loss) {
            return Err(Error::schema(format!(
                "link {}: loss {} outside 0-100",
                self.id, self.loss
            )));
        }
        for (field, value) in [
            ("latency", self.latency),
            ("bandwidth", self.bandwidth),
            ("jitter", self.jitter),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::schema(format!(
                    "link {}: {field} must be a non-negative number, got {value}",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends a link.
    #[must_use]
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Returns the first node with the given id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the first link with the given id.
    #[must_use]
    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Returns the first link with the given id, mutably.
    pub fn link_mut(&mut self, id: &str) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.id == id)
    }

    /// Returns every link touching `node_id`, in declaration order.
    pub fn links_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.touches(node_id))
    }

    /// Builds the node-id to tags lookup used by policy evaluation.
    #[must_use]
    pub fn node_tags(&self) -> HashMap<String, Vec<String>> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.tags.clone()))
            .collect()
    }

    /// Checks schema-level constraints that serde cannot express.
    ///
    /// Structural soundness (duplicate ids, dangling links) is left to the
    /// topology validator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] on the first violation found.
    pub fn check_schema(&self) -> Result<()> {
        let mut interface_ids = HashSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(Error::schema("node id must not be empty"));
            }
            interface_ids.clear();
            for iface in &node.interfaces {
                if !interface_ids.insert(iface.id.as_str()) {
                    return Err(Error::schema(format!(
                        "node {}: duplicate interface id {}",
                        node.id, iface.id
                    )));
                }
            }
        }
        self.links.iter().try_for_each(Link::check_schema)
    }
}
