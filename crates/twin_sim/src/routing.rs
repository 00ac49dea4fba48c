//! Hop-count routing over a topology.
//!
//! Paths are found with a FIFO breadth-first search. Among equal-length
//! candidates the first neighbour enumerated wins, and neighbours are
//! enumerated in link declaration order, so results are deterministic for a
//! given graph.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use twin_model::result::{LatencyMatrix, ReachabilityMatrix};
use twin_model::Graph;

/// A discovered path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Node ids from source to destination inclusive.
    pub path: Vec<String>,
    /// Link ids traversed, one fewer than `path`.
    pub links: Vec<String>,
}

impl Route {
    fn zero_hop(node_id: &str) -> Self {
        Self {
            path: vec![node_id.to_string()],
            links: Vec::new(),
        }
    }

    /// Number of links traversed.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.links.len()
    }
}

/// Neighbour lists of a graph, excluding failed links.
#[derive(Debug, Clone)]
pub struct Adjacency<'g> {
    edges: HashMap<&'g str, Vec<Edge<'g>>>,
}

#[derive(Debug, Clone, Copy)]
struct Edge<'g> {
    node: &'g str,
    link: &'g str,
}

/// One dequeued BFS entry; `parent` indexes the settled list.
#[derive(Debug, Clone, Copy)]
struct Step<'g> {
    node: &'g str,
    link: Option<&'g str>,
    parent: Option<usize>,
}

/// Settled BFS tree rooted at one source.
struct Tree<'g> {
    steps: Vec<Step<'g>>,
    index: HashMap<&'g str, usize>,
}

impl Tree<'_> {
    fn route(&self, node_id: &str) -> Option<Route> {
        let mut cursor = self.index.get(node_id).copied();
        let mut path = Vec::new();
        let mut links = Vec::new();
        while let Some(idx) = cursor {
            let step = self.steps[idx];
            path.push(step.node.to_string());
            if let Some(link) = step.link {
                links.push(link.to_string());
            }
            cursor = step.parent;
        }
        if path.is_empty() {
            return None;
        }
        path.reverse();
        links.reverse();
        Some(Route { path, links })
    }

    fn reaches(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }
}

impl<'g> Adjacency<'g> {
    /// Builds neighbour lists for every node of `graph`.
    ///
    /// Each non-failed link adds `target` to the source's list and `source`
    /// to the target's list. Endpoints that are not declared nodes are
    /// ignored.
    pub fn new(graph: &'g Graph) -> Self {
        let mut edges: HashMap<&'g str, Vec<Edge<'g>>> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), Vec::new()))
            .collect();

        for link in graph.links.iter().filter(|l| !l.failed) {
            if let Some(list) = edges.get_mut(link.source.as_str()) {
                list.push(Edge {
                    node: &link.target,
                    link: &link.id,
                });
            }
            if let Some(list) = edges.get_mut(link.target.as_str()) {
                list.push(Edge {
                    node: &link.source,
                    link: &link.id,
                });
            }
        }

        Self { edges }
    }

    /// Returns `(neighbour id, link id)` pairs for `node_id` in enumeration order.
    pub fn neighbours(&self, node_id: &str) -> impl Iterator<Item = (&'g str, &'g str)> + '_ {
        self.edges
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|e| (e.node, e.link))
    }

    /// Finds the fewest-hop path from `from` to `to`.
    ///
    /// `from == to` yields a zero-hop route even if the node is unknown.
    pub fn find_path(&self, from: &str, to: &str) -> Option<Route> {
        if from == to {
            return Some(Route::zero_hop(from));
        }
        self.explore(from, Some(to)).route(to)
    }

    /// Runs BFS from `source`, stopping early once `stop_at` is settled.
    ///
    /// A node is settled the first time it is dequeued, which gives the same
    /// paths as an independent search per destination.
    fn explore(&self, source: &str, stop_at: Option<&str>) -> Tree<'g> {
        let mut tree = Tree {
            steps: Vec::new(),
            index: HashMap::new(),
        };
        let Some((&root, _)) = self.edges.get_key_value(source) else {
            return tree;
        };

        let mut visited: HashSet<&'g str> = HashSet::new();
        let mut queue: VecDeque<Step<'g>> = VecDeque::new();
        queue.push_back(Step {
            node: root,
            link: None,
            parent: None,
        });

        while let Some(step) = queue.pop_front() {
            if !visited.insert(step.node) {
                continue;
            }
            let idx = tree.steps.len();
            tree.steps.push(step);
            tree.index.insert(step.node, idx);

            if stop_at == Some(step.node) {
                break;
            }

            for (node, link) in self.neighbours(step.node) {
                if !visited.contains(node) {
                    queue.push_back(Step {
                        node,
                        link: Some(link),
                        parent: Some(idx),
                    });
                }
            }
        }

        tree
    }
}

/// Finds the fewest-hop path between two nodes, ignoring failed links.
///
/// # Example
///
/// ```rust
/// use twin_model::fixtures;
/// use twin_sim::find_path;
///
/// let graph = fixtures::chain(&["a", "b", "c"]);
/// let route = find_path(&graph, "a", "c").unwrap();
/// assert_eq!(route.path, vec!["a", "b", "c"]);
/// assert_eq!(route.links, vec!["l1", "l2"]);
/// ```
pub fn find_path(graph: &Graph, from: &str, to: &str) -> Option<Route> {
    Adjacency::new(graph).find_path(from, to)
}

/// Sums the latency of the given links. Unknown link ids contribute nothing.
pub fn path_latency(graph: &Graph, link_ids: &[String]) -> f64 {
    link_ids
        .iter()
        .filter_map(|id| graph.link(id))
        .map(|l| l.latency)
        .sum()
}

/// All-pairs reachability over declared nodes. Every node reaches itself.
pub fn reachability_matrix(graph: &Graph) -> ReachabilityMatrix {
    let adjacency = Adjacency::new(graph);
    let mut matrix = ReachabilityMatrix::new();

    for source in &graph.nodes {
        let tree = adjacency.explore(&source.id, None);
        let row = graph
            .nodes
            .iter()
            .map(|target| {
                let reachable = source.id == target.id || tree.reaches(&target.id);
                (target.id.clone(), reachable)
            })
            .collect();
        matrix.insert(source.id.clone(), row);
    }

    matrix
}

/// All-pairs path latency over declared nodes.
///
/// Zero on the diagonal, the summed latency of the BFS path when reachable,
/// and `f64::INFINITY` otherwise.
pub fn latency_matrix(graph: &Graph) -> LatencyMatrix {
    let adjacency = Adjacency::new(graph);
    let mut matrix = LatencyMatrix::new();

    for source in &graph.nodes {
        let tree = adjacency.explore(&source.id, None);
        let row = graph
            .nodes
            .iter()
            .map(|target| {
                let ms = if source.id == target.id {
                    0.0
                } else {
                    tree.route(&target.id)
                        .map_or(f64::INFINITY, |r| path_latency(graph, &r.links))
                };
                (target.id.clone(), ms)
            })
            .collect();
        matrix.insert(source.id.clone(), row);
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use twin_model::fixtures;
    use twin_model::{Link, Node, NodeType};

    fn square() -> Graph {
        // a -- b -- d and a -- c -- d: two equal-length routes.
        Graph::new()
            .with_node(Node::new("a", NodeType::Router, "A"))
            .with_node(Node::new("b", NodeType::Router, "B"))
            .with_node(Node::new("c", NodeType::Router, "C"))
            .with_node(Node::new("d", NodeType::Router, "D"))
            .with_link(Link::new("ac", "a", "c").with_latency(5.0))
            .with_link(Link::new("ab", "a", "b").with_latency(1.0))
            .with_link(Link::new("bd", "b", "d").with_latency(1.0))
            .with_link(Link::new("cd", "c", "d").with_latency(5.0))
    }

    #[test]
    fn zero_hop_route() {
        let route = find_path(&fixtures::router_server(), "router", "router").unwrap();
        assert_eq!(route.path, vec!["router"]);
        assert!(route.links.is_empty());
        assert_eq!(route.hops(), 0);
    }

    #[test]
    fn zero_hop_for_unknown_node() {
        let route = find_path(&Graph::new(), "ghost", "ghost").unwrap();
        assert_eq!(route.path, vec!["ghost"]);
    }

    #[test]
    fn unknown_endpoints_have_no_path() {
        let graph = fixtures::router_server();
        assert!(find_path(&graph, "router", "ghost").is_none());
        assert!(find_path(&graph, "ghost", "router").is_none());
    }

    #[test]
    fn tie_break_follows_link_order() {
        // "ac" is declared before "ab", so c is enumerated first from a.
        let route = find_path(&square(), "a", "d").unwrap();
        assert_eq!(route.path, vec!["a", "c", "d"]);
        assert_eq!(route.links, vec!["ac", "cd"]);
    }

    #[test]
    fn hop_count_not_latency() {
        let graph = square();
        let route = find_path(&graph, "a", "d").unwrap();
        assert!((path_latency(&graph, &route.links) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_links_are_skipped() {
        let mut graph = square();
        graph.link_mut("ac").unwrap().failed = true;
        let route = find_path(&graph, "a", "d").unwrap();
        assert_eq!(route.links, vec!["ab", "bd"]);
    }

    #[test]
    fn links_are_bidirectional() {
        let graph = fixtures::chain(&["x", "y", "z"]);
        let route = find_path(&graph, "z", "x").unwrap();
        assert_eq!(route.path, vec!["z", "y", "x"]);
        assert_eq!(route.links, vec!["l2", "l1"]);
    }

    #[test]
    fn neighbours_in_declaration_order() {
        let graph = square();
        let adjacency = Adjacency::new(&graph);
        let from_a: Vec<_> = adjacency.neighbours("a").collect();
        assert_eq!(from_a, vec![("c", "ac"), ("b", "ab")]);
        assert_eq!(adjacency.neighbours("ghost").count(), 0);
    }

    #[test]
    fn path_latency_ignores_unknown_links() {
        let graph = fixtures::chain(&["a", "b", "c"]);
        let total = path_latency(&graph, &["l1".to_string(), "nope".to_string(), "l2".to_string()]);
        assert!((total - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn matrices_for_partitioned_graph() {
        let mut graph = fixtures::chain(&["a", "b", "c"]);
        graph.link_mut("l2").unwrap().failed = true;

        let reach = reachability_matrix(&graph);
        assert!(reach["a"]["b"]);
        assert!(!reach["a"]["c"]);
        assert!(reach["c"]["c"]);

        let latency = latency_matrix(&graph);
        assert!(latency["a"]["a"].abs() < f64::EPSILON);
        assert!((latency["a"]["b"] - 1.0).abs() < f64::EPSILON);
        assert!(latency["a"]["c"].is_infinite());
    }

    #[test]
    fn latency_matrix_uses_bfs_route() {
        let latency = latency_matrix(&square());
        // The BFS route a-c-d is taken even though a-b-d is cheaper.
        assert!((latency["a"]["d"] - 10.0).abs() < f64::EPSILON);
        assert!((latency["d"]["a"] - 2.0).abs() < f64::EPSILON);
    }

    fn arb_graph() -> impl Strategy<Value = Graph> {
        (1usize..8).prop_flat_map(|n| {
            let links = prop::collection::vec((0..n, 0..n, any::<bool>(), 0u8..20), 0..16);
            links.prop_map(move |links| {
                let mut graph = Graph::new();
                for i in 0..n {
                    graph.nodes.push(Node::new(format!("n{i}"), NodeType::Router, format!("N{i}")));
                }
                for (i, (s, t, failed, ms)) in links.into_iter().enumerate() {
                    let mut link = Link::new(format!("l{i}"), format!("n{s}"), format!("n{t}"))
                        .with_latency(f64::from(ms));
                    link.failed = failed;
                    graph.links.push(link);
                }
                graph
            })
        })
    }

    proptest! {
        #[test]
        fn reachability_is_reflexive_and_symmetric(graph in arb_graph()) {
            let matrix = reachability_matrix(&graph);
            for a in &graph.nodes {
                prop_assert!(matrix[&a.id][&a.id]);
                for b in &graph.nodes {
                    prop_assert_eq!(matrix[&a.id][&b.id], matrix[&b.id][&a.id]);
                }
            }
        }

        #[test]
        fn routes_follow_live_links(graph in arb_graph()) {
            for a in &graph.nodes {
                for b in &graph.nodes {
                    if let Some(route) = find_path(&graph, &a.id, &b.id) {
                        prop_assert_eq!(route.path.len(), route.links.len() + 1);
                        prop_assert_eq!(route.path.first(), Some(&a.id));
                        prop_assert_eq!(route.path.last(), Some(&b.id));
                        for (i, link_id) in route.links.iter().enumerate() {
                            let link = graph.link(link_id).unwrap();
                            prop_assert!(!link.failed);
                            prop_assert!(link.touches(&route.path[i]));
                            prop_assert_eq!(link.other_end(&route.path[i]), route.path[i + 1].as_str());
                        }
                    }
                }
            }
        }

        #[test]
        fn matrix_agrees_with_find_path(graph in arb_graph()) {
            let reach = reachability_matrix(&graph);
            let latency = latency_matrix(&graph);
            for a in &graph.nodes {
                for b in &graph.nodes {
                    let route = find_path(&graph, &a.id, &b.id);
                    prop_assert_eq!(reach[&a.id][&b.id], route.is_some());
                    let expected = route.map_or(f64::INFINITY, |r| path_latency(&graph, &r.links));
                    prop_assert!(
                        (latency[&a.id][&b.id] - expected).abs() < 1e-9
                            || (latency[&a.id][&b.id].is_infinite() && expected.is_infinite())
                    );
                }
            }
        }
    }
}
