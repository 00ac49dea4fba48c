//! Blast radius of a compromised node.
//!
//! Only direct neighbours are considered affected. Failed links count: a
//! compromised host can still reach what it is cabled to.

use crate::error::{Error, Result};
use twin_model::{BlastRadius, Graph, Severity};

/// Score per affected node.
const PER_NODE: u64 = 10;
/// Score for a neighbour left without any link once the compromised node is removed.
const STRANDED: u64 = 20;

const fn criticality_weight(severity: Severity) -> u64 {
    match severity {
        Severity::Critical => 50,
        Severity::High => 30,
        Severity::Medium => 10,
        Severity::Low | Severity::Info => 0,
    }
}

/// Computes the blast radius of compromising `node_id`.
///
/// # Errors
///
/// Returns [`Error::UnknownNode`] if `node_id` is not declared in `graph`.
///
/// # Example
///
/// ```rust
/// use twin_model::fixtures;
/// use twin_sim::blast_radius;
///
/// let report = blast_radius(&fixtures::chain(&["a", "b", "c"]), "b").unwrap();
/// assert_eq!(report.affected_node_ids, vec!["b", "a", "c"]);
/// ```
pub fn blast_radius(graph: &Graph, node_id: &str) -> Result<BlastRadius> {
    if graph.node(node_id).is_none() {
        return Err(Error::UnknownNode(node_id.to_string()));
    }

    let mut affected_nodes: Vec<&str> = vec![node_id];
    let mut affected_links: Vec<&str> = Vec::new();
    for link in graph.links_touching(node_id) {
        affected_links.push(&link.id);
        let neighbour = link.other_end(node_id);
        if !affected_nodes.contains(&neighbour) {
            affected_nodes.push(neighbour);
        }
    }

    let mut score = PER_NODE * affected_nodes.len() as u64;
    score += affected_nodes
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|n| criticality_weight(n.risk_criticality))
        .sum::<u64>();

    let stranded = graph
        .nodes
        .iter()
        .filter(|n| n.id != node_id)
        .filter(|n| {
            graph
                .links_touching(&n.id)
                .any(|l| l.touches(node_id))
        })
        .filter(|n| {
            !graph
                .links_touching(&n.id)
                .any(|l| !l.touches(node_id))
        })
        .count() as u64;
    score += STRANDED * stranded;

    Ok(BlastRadius {
        compromised_node_id: node_id.to_string(),
        affected_node_ids: affected_nodes.into_iter().map(str::to_string).collect(),
        affected_link_ids: affected_links.into_iter().map(str::to_string).collect(),
        impact_score: score,
    })
}
