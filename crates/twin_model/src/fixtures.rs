//! Sample topologies and scenarios.
//!
//! Used by tests across the workspace and by `twin init` to seed a project.

use crate::graph::{Graph, Link, LinkType, Node, NodeType, Severity};
use crate::scenario::{AttackEvent, AttackKind, Fault, FaultKind, Flow, Scenario};

/// Policy installed on the office firewall.
pub const OFFICE_POLICY: &str = "\
# Office perimeter
allow tcp from Any to web1 port 443
allow tcp from staff to db1 port 5432
deny any from guest to Any
deny any from Any to Any
";

/// A router linked to a server with 1ms latency.
#[must_use]
pub fn router_server() -> Graph {
    Graph::new()
        .with_node(Node::new("router", NodeType::Router, "Router"))
        .with_node(Node::new("server", NodeType::Server, "Server"))
        .with_link(Link::new("l1", "router", "server").with_latency(1.0))
}

/// `users -- fw1 -- webapp`, with `policy` installed on the firewall.
#[must_use]
pub fn firewalled_web(policy: &str) -> Graph {
    Graph::new()
        .with_node(Node::new("users", NodeType::Workstation, "Users").with_tag("staff"))
        .with_node(Node::new("fw1", NodeType::Firewall, "Edge FW").with_property("policy", policy))
        .with_node(Node::new("webapp", NodeType::Server, "Web App"))
        .with_link(Link::new("l1", "users", "fw1").with_latency(1.0))
        .with_link(Link::new("l2", "fw1", "webapp").with_latency(2.0))
}

/// A linear chain `ids[0] -- ids[1] -- ...` with links `l1`, `l2`, ...
#[must_use]
pub fn chain(ids: &[&str]) -> Graph {
    let mut graph = Graph::new();
    for id in ids {
        graph.nodes.push(Node::new(*id, NodeType::Router, id.to_uppercase()));
    }
    for (i, pair) in ids.windows(2).enumerate() {
        graph
            .links
            .push(Link::new(format!("l{}", i + 1), pair[0], pair[1]).with_latency(1.0));
    }
    graph
}

/// A small office network with a perimeter firewall, a public web server,
/// a database, staff and admin workstations, and a guest kiosk.
#[must_use]
pub fn office() -> Graph {
    Graph::new()
        .with_node(Node::new("isp", NodeType::Router, "ISP Router").with_tag("internet"))
        .with_node(
            Node::new("fw1", NodeType::Firewall, "Perimeter Firewall")
                .with_tag("security")
                .with_criticality(Severity::High)
                .with_property("policy", OFFICE_POLICY),
        )
        .with_node(Node::new("core", NodeType::Switch, "Core Switch"))
        .with_node(
            Node::new("web1", NodeType::Server, "Web Server")
                .with_tag("public")
                .with_criticality(Severity::High),
        )
        .with_node(
            Node::new("db1", NodeType::Server, "Database")
                .with_tag("internal")
                .with_criticality(Severity::Critical),
        )
        .with_node(Node::new("ws1", NodeType::Workstation, "Staff Laptop").with_tag("staff"))
        .with_node(
            Node::new("adm1", NodeType::Workstation, "Admin Console")
                .with_role("admin")
                .with_tag("staff"),
        )
        .with_node(Node::new("kiosk", NodeType::Workstation, "Lobby Kiosk").with_tag("guest"))
        .with_link(Link::new("l-isp", "isp", "fw1").with_type(LinkType::Wan).with_latency(12.0))
        .with_link(Link::new("l-core", "fw1", "core").with_latency(1.0))
        .with_link(Link::new("l-web", "core", "web1").with_latency(1.0))
        .with_link(Link::new("l-db", "core", "db1").with_latency(1.0))
        .with_link(Link::new("l-ws", "core", "ws1").with_latency(2.0))
        .with_link(Link::new("l-adm", "core", "adm1").with_latency(2.0))
        .with_link(Link::new("l-kiosk", "kiosk", "adm1").with_type(LinkType::Wifi).with_latency(5.0))
}

/// A scenario exercising [`office`]: allowed and blocked flows, a link
/// failure, and two attack events.
#[must_use]
pub fn office_scenario() -> Scenario {
    Scenario::new("office-baseline", "Office baseline", "office")
        .with_flow(Flow::new("https-in", "isp", "web1", "tcp").with_port(443))
        .with_flow(Flow::new("db-from-internet", "isp", "db1", "tcp").with_port(5432))
        .with_flow(Flow::new("staff-db", "ws1", "db1", "tcp").with_port(5432))
        .with_flow(Flow::new("kiosk-web", "kiosk", "web1", "tcp").with_port(80))
        .with_fault(Fault::new("wifi-outage", FaultKind::LinkDown, "l-kiosk"))
        .with_attack(
            AttackEvent::new("recon", AttackKind::ReconScan, "isp").with_target("db1"),
        )
        .with_attack(
            AttackEvent::new("pivot", AttackKind::LateralMovement, "ws1").with_target("adm1"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_links_neighbours() {
        let graph = chain(&["n1", "n2", "n3"]);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 2);
        assert_eq!(graph.links[1].id, "l2");
        assert_eq!(graph.links[1].source, "n2");
        assert_eq!(graph.links[1].target, "n3");
    }

    #[test]
    fn fixtures_pass_schema_checks() {
        assert!(router_server().check_schema().is_ok());
        assert!(firewalled_web("deny any from Any to Any").check_schema().is_ok());
        assert!(office().check_schema().is_ok());
        assert!(office_scenario().check_schema().is_ok());
    }

    #[test]
    fn firewall_carries_policy() {
        let graph = firewalled_web("allow from Any to Any");
        let fw = graph.node("fw1").unwrap();
        assert!(fw.is_firewall());
        assert_eq!(fw.property_str("policy"), Some("allow from Any to Any"));
    }
}
