//! Structural validation of a topology.
//!
//! Errors (duplicate node ids, dangling link endpoints) make a graph invalid.
//! Warnings (isolated nodes, high-degree nodes) never affect validity.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use twin_model::Graph;

/// Link-endpoint count at which a node is reported as a single point of failure.
pub const SPOF_DEGREE: usize = 3;

/// Outcome of validating a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `errors` is empty.
    pub valid: bool,
    /// Fatal problems.
    pub errors: Vec<Issue>,
    /// Non-fatal observations.
    pub warnings: Vec<Issue>,
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Human-readable description.
    pub message: String,
    /// Node involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Link involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
}

impl Issue {
    fn node(node_id: &str, message: String) -> Self {
        Self {
            message,
            node_id: Some(node_id.to_string()),
            link_id: None,
        }
    }

    fn link(link_id: &str, message: String) -> Self {
        Self {
            message,
            node_id: None,
            link_id: Some(link_id.to_string()),
        }
    }
}

impl ValidationReport {
    /// Joins error messages with `", "`.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Validates the structure of a graph.
///
/// # Example
///
/// ```rust
/// use twin_model::fixtures;
/// use twin_sim::validate_graph;
///
/// let report = validate_graph(&fixtures::chain(&["a", "b", "c"]));
/// assert!(report.valid);
/// assert!(report.warnings.is_empty());
/// ```
pub fn validate_graph(graph: &Graph) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut node_ids: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !node_ids.insert(&node.id) {
            errors.push(Issue::node(&node.id, format!("Duplicate node ID: {}", node.id)));
        }
    }

    for link in &graph.links {
        if !node_ids.contains(link.source.as_str()) {
            errors.push(Issue::link(
                &link.id,
                format!(
                    "Link {} references non-existent source node: {}",
                    link.id, link.source
                ),
            ));
        }
        if !node_ids.contains(link.target.as_str()) {
            errors.push(Issue::link(
                &link.id,
                format!(
                    "Link {} references non-existent target node: {}",
                    link.id, link.target
                ),
            ));
        }
    }

    if graph.nodes.len() > 1 {
        let connected: HashSet<&str> = graph
            .links
            .iter()
            .flat_map(|l| [l.source.as_str(), l.target.as_str()])
            .collect();
        for node in &graph.nodes {
            if !connected.contains(node.id.as_str()) {
                warnings.push(Issue::node(
                    &node.id,
                    format!("Node {} ({}) is isolated (no connections)", node.label, node.id),
                ));
            }
        }
    }

    for node_id in single_points_of_failure(graph) {
        let label = graph.node(node_id).map_or(node_id, |n| n.label.as_str());
        warnings.push(Issue::node(
            node_id,
            format!("Node {label} ({node_id}) is a single point of failure"),
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Degree heuristic: any node touched by at least [`SPOF_DEGREE`] link
/// endpoints. Not an articulation-point analysis.
///
/// Nodes are reported in the order they are first seen in the link list.
fn single_points_of_failure(graph: &Graph) -> Vec<&str> {
    let mut order: Vec<&str> = Vec::new();
    let mut degree: HashMap<&str, usize> = HashMap::new();

    for link in &graph.links {
        for endpoint in [link.source.as_str(), link.target.as_str()] {
            let count = degree.entry(endpoint).or_insert_with(|| {
                order.push(endpoint);
                0
            });
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|id| degree[id] >= SPOF_DEGREE)
        .collect()
}
