//! Fault injection.
//!
//! Faults are applied in scenario order to a copy of the topology; the
//! caller's graph is never touched. Later faults on the same link overwrite
//! earlier ones.

use tracing::debug;
use twin_model::{Fault, FaultKind, Graph};

/// Returns a copy of `graph` with every fault applied.
///
/// Unknown targets are ignored. `duration` is carried but not enforced: a
/// fault stays in effect for the whole run.
///
/// # Example
///
/// ```rust
/// use twin_model::{fixtures, Fault, FaultKind};
/// use twin_sim::apply_faults;
///
/// let graph = fixtures::router_server();
/// let faulted = apply_faults(&graph, &[Fault::new("f1", FaultKind::LinkDown, "l1")]);
/// assert!(faulted.link("l1").unwrap().failed);
/// assert!(!graph.link("l1").unwrap().failed);
/// ```
pub fn apply_faults(graph: &Graph, faults: &[Fault]) -> Graph {
    let mut faulted = graph.clone();
    for fault in faults {
        apply_fault(&mut faulted, fault);
    }
    faulted
}

fn apply_fault(graph: &mut Graph, fault: &Fault) {
    match fault.kind {
        FaultKind::LinkDown => match graph.link_mut(&fault.target_id) {
            Some(link) => link.failed = true,
            None => debug!(fault = %fault.id, target = %fault.target_id, "link-down target not found"),
        },
        FaultKind::LinkDegraded => {
            let Some(link) = graph.link_mut(&fault.target_id) else {
                debug!(fault = %fault.id, target = %fault.target_id, "link-degraded target not found");
                return;
            };
            if let Some(params) = fault.params {
                if let Some(latency) = params.latency {
                    link.latency = latency;
                }
                if let Some(loss) = params.loss {
                    link.loss = loss;
                }
            }
        }
        FaultKind::NodeDown => {
            let mut hit = 0usize;
            for link in graph.links.iter_mut().filter(|l| l.touches(&fault.target_id)) {
                link.failed = true;
                hit += 1;
            }
            debug!(fault = %fault.id, node = %fault.target_id, links = hit, "node-down applied");
        }
    }
}
