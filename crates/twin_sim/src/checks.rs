//! Static topology checks run after traffic simulation.

use twin_model::{Finding, Graph, Node, NodeType, Severity};

/// Checks that a server tagged `public` has TLS or HTTPS enabled.
pub fn check_public_tls(node: &Node) -> Option<Finding> {
    let exposed = node.node_type == NodeType::Server && node.has_tag("public");
    if !exposed || node.property_truthy("tls") || node.property_truthy("https") {
        return None;
    }
    Some(
        Finding::new(
            Severity::Medium,
            "Public Service Without TLS",
            format!(
                "Server {} is publicly accessible but does not have TLS enabled",
                node.label
            ),
        )
        .with_nodes([node.id.as_str()])
        .with_category("misconfiguration")
        .with_remediation("Enable TLS/HTTPS for public-facing services"),
    )
}

/// Checks that an admin node has no link with a guest-tagged endpoint.
pub fn check_admin_guest(graph: &Graph, node: &Node) -> Option<Finding> {
    let is_admin = node.role.as_deref() == Some("admin") || node.has_tag("admin");
    if !is_admin {
        return None;
    }

    let is_guest = |id: &str| graph.node(id).is_some_and(|n| n.has_tag("guest"));
    let guest_links: Vec<&str> = graph
        .links_touching(&node.id)
        .filter(|l| is_guest(l.source.as_str()) || is_guest(l.target.as_str()))
        .map(|l| l.id.as_str())
        .collect();
    if guest_links.is_empty() {
        return None;
    }

    Some(
        Finding::new(
            Severity::Critical,
            "Admin Interface Accessible from Guest Network",
            format!("Admin node {} is accessible from guest network", node.label),
        )
        .with_nodes([node.id.as_str()])
        .with_links(guest_links)
        .with_category("access-control")
        .with_remediation(
            "Implement network segmentation to isolate admin interfaces from guest networks",
        ),
    )
}

/// Runs every static check, node by node in declaration order.
///
/// Failed links still count as adjacency for the guest check.
pub fn analyze(graph: &Graph) -> Vec<Finding> {
    graph
        .nodes
        .iter()
        .flat_map(|node| [check_public_tls(node), check_admin_guest(graph, node)])
        .flatten()
        .collect()
}
