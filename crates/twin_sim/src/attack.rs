//! Attack event resolution.
//!
//! An attack is blocked when its target is unreachable from the source, or
//! when any firewall sits on the route. Firewall policy is not consulted for
//! attacks.

use crate::routing::{Adjacency, Route};
use serde::{Deserialize, Serialize};
use serde_json::json;
use twin_model::{AttackEvent, Finding, Graph, Node, Severity};

/// `blocked_by` value for an attack whose target is unreachable.
pub const NETWORK_ISOLATION: &str = "network-isolation";

/// Outcome of an attack event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackVerdict {
    /// Whether the attack was stopped.
    pub blocked: bool,
    /// Firewall id, or [`NETWORK_ISOLATION`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

impl AttackVerdict {
    const fn succeeded() -> Self {
        Self {
            blocked: false,
            blocked_by: None,
        }
    }

    fn stopped_by(by: impl Into<String>) -> Self {
        Self {
            blocked: true,
            blocked_by: Some(by.into()),
        }
    }

    /// Builds the finding reported for `event`.
    pub fn finding(&self, event: &AttackEvent) -> Finding {
        let source = &event.source_node_id;
        let (severity, description, remediation) = match self.blocked_by.as_deref() {
            Some(by) if self.blocked => (
                Severity::Low,
                format!("Attack attempt from {source} was blocked by {by}"),
                "No action needed - attack was blocked",
            ),
            _ => (
                Severity::High,
                format!("Attack event {} from {source} was successful", event.kind),
                "Implement network segmentation and monitoring",
            ),
        };

        let mut nodes = vec![source.clone()];
        nodes.extend(event.target_node_id.iter().cloned());

        Finding::new(severity, format!("Attack Event: {}", event.kind), description)
            .with_nodes(nodes)
            .with_category("security")
            .with_evidence(json!({
                "event": event,
                "blocked": self.blocked,
                "blockedBy": self.blocked_by,
            }))
            .with_remediation(remediation)
    }
}

/// Returns the first firewall, in node declaration order, whose id lies on `route`.
pub fn firewall_on_path<'g>(graph: &'g Graph, route: &Route) -> Option<&'g Node> {
    graph
        .nodes
        .iter()
        .find(|n| n.is_firewall() && route.path.contains(&n.id))
}

/// Resolves an attack event against a (faulted) topology.
///
/// Attacks without a target always succeed.
///
/// # Example
///
/// ```rust
/// use twin_model::{fixtures, AttackEvent, AttackKind};
/// use twin_sim::resolve_attack;
///
/// let graph = fixtures::firewalled_web("allow from Any to Any");
/// let event = AttackEvent::new("a1", AttackKind::LateralMovement, "users").with_target("webapp");
/// let verdict = resolve_attack(&graph, &event);
/// assert!(verdict.blocked);
/// assert_eq!(verdict.blocked_by.as_deref(), Some("fw1"));
/// ```
pub fn resolve_attack(graph: &Graph, event: &AttackEvent) -> AttackVerdict {
    resolve_with(&Adjacency::new(graph), graph, event)
}

pub(crate) fn resolve_with(adjacency: &Adjacency<'_>, graph: &Graph, event: &AttackEvent) -> AttackVerdict {
    let Some(target) = event.target_node_id.as_deref() else {
        return AttackVerdict::succeeded();
    };

    match adjacency.find_path(&event.source_node_id, target) {
        None => AttackVerdict::stopped_by(NETWORK_ISOLATION),
        Some(route) => firewall_on_path(graph, &route)
            .map_or_else(AttackVerdict::succeeded, |fw| AttackVerdict::stopped_by(&fw.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_model::{fixtures, AttackKind, Fault, FaultKind};

    #[test]
    fn reachable_without_firewall_succeeds() {
        let graph = fixtures::chain(&["a", "b", "c"]);
        let event = AttackEvent::new("e", AttackKind::LateralMovement, "a").with_target("c");
        assert_eq!(resolve_attack(&graph, &event), AttackVerdict::succeeded());
    }

    #[test]
    fn unreachable_target_is_isolated() {
        let graph = crate::apply_faults(
            &fixtures::chain(&["a", "b", "c"]),
            &[Fault::new("f", FaultKind::LinkDown, "l2")],
        );
        let event = AttackEvent::new("e", AttackKind::DataExfilAttempt, "a").with_target("c");
        let verdict = resolve_attack(&graph, &event);
        assert!(verdict.blocked);
        assert_eq!(verdict.blocked_by.as_deref(), Some(NETWORK_ISOLATION));
    }

    #[test]
    fn firewall_blocks_even_with_allow_all_policy() {
        let graph = fixtures::firewalled_web("allow from Any to Any");
        let event = AttackEvent::new("e", AttackKind::CredentialReuse, "users").with_target("webapp");
        assert_eq!(resolve_attack(&graph, &event).blocked_by.as_deref(), Some("fw1"));
    }

    #[test]
    fn no_target_succeeds() {
        let graph = fixtures::firewalled_web("deny any from Any to Any");
        let event = AttackEvent::new("e", AttackKind::PhishingCompromise, "users");
        assert!(!resolve_attack(&graph, &event).blocked);
    }

    #[test]
    fn attack_on_self_is_not_blocked() {
        let graph = fixtures::router_server();
        let event = AttackEvent::new("e", AttackKind::PrivilegeEscalation, "server").with_target("server");
        assert!(!resolve_attack(&graph, &event).blocked);
    }

    #[test]
    fn blocked_finding_texts() {
        let event = AttackEvent::new("e", AttackKind::ReconScan, "isp").with_target("db1");
        let finding = AttackVerdict::stopped_by("fw1").finding(&event);

        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.title, "Attack Event: recon-scan");
        assert_eq!(finding.description, "Attack attempt from isp was blocked by fw1");
        assert_eq!(finding.affected_node_ids, vec!["isp", "db1"]);
        assert_eq!(finding.category.as_deref(), Some("security"));
        assert_eq!(
            finding.remediation.as_deref(),
            Some("No action needed - attack was blocked")
        );
        let evidence = finding.evidence.unwrap();
        assert_eq!(evidence["blocked"], json!(true));
        assert_eq!(evidence["blockedBy"], json!("fw1"));
        assert_eq!(evidence["event"]["sourceNodeId"], json!("isp"));
    }

    #[test]
    fn successful_finding_texts() {
        let event = AttackEvent::new("e", AttackKind::LateralMovement, "ws1");
        let finding = AttackVerdict::succeeded().finding(&event);

        assert_eq!(finding.severity, Severity::High);
        assert_eq!(
            finding.description,
            "Attack event lateral-movement from ws1 was successful"
        );
        assert_eq!(finding.affected_node_ids, vec!["ws1"]);
        assert_eq!(
            finding.remediation.as_deref(),
            Some("Implement network segmentation and monitoring")
        );
    }

    #[test]
    fn first_declared_firewall_wins() {
        let mut graph = fixtures::chain(&["a", "fw-b", "fw-a", "z"]);
        // Declare fw-a before fw-b; the route still meets fw-b first.
        graph.nodes.swap(1, 2);
        for node in &mut graph.nodes {
            if node.id.starts_with("fw") {
                node.node_type = twin_model::NodeType::Firewall;
            }
        }
        let route = crate::find_path(&graph, "a", "z").unwrap();
        assert_eq!(route.path, vec!["a", "fw-b", "fw-a", "z"]);
        assert_eq!(firewall_on_path(&graph, &route).unwrap().id, "fw-a");
    }
}
