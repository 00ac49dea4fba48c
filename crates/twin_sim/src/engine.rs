//! Simulation engine.

use crate::attack::{firewall_on_path, resolve_with};
use crate::blast::blast_radius;
use crate::checks;
use crate::config::SimConfig;
use crate::context::{Counters, RunContext};
use crate::error::Result;
use crate::faults::apply_faults;
use crate::routing::{latency_matrix, reachability_matrix, Adjacency};
use crate::validation::{validate_graph, Issue};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};
use twin_model::{
    loader, AttackEvent, BlastRadius, Finding, Flow, Graph, Metrics, Node, RunResult, RunStatus,
    Scenario, Severity, SimEvent, SimEventKind,
};
use twin_policy::{Decision, EvaluationContext, Evaluator, NodeTags};

/// Network simulation engine.
///
/// The engine holds configuration only. Each [`Engine::simulate`] call owns
/// its run state, so one engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: SimConfig,
}

/// Read-only view of the faulted topology shared by flow and attack steps.
struct Topology<'g> {
    graph: &'g Graph,
    adjacency: Adjacency<'g>,
    tags: NodeTags,
}

impl Engine {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Loads a topology and scenario from disk and simulates them.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read, parsed or fails
    /// schema checks. Simulation itself never fails.
    pub fn simulate_files(
        &self,
        graph_path: impl AsRef<Path>,
        scenario_path: impl AsRef<Path>,
    ) -> Result<RunResult> {
        let graph = loader::load_graph(graph_path)?;
        let scenario = loader::load_scenario(scenario_path)?;
        Ok(self.simulate(&graph, &scenario))
    }

    /// Simulates `scenario` against `graph`.
    ///
    /// A structurally invalid graph yields a [`RunStatus::Failed`] result with
    /// a single event describing the validation errors. `graph` is never
    /// modified.
    pub fn simulate(&self, graph: &Graph, scenario: &Scenario) -> RunResult {
        let mut ctx = RunContext::new(&scenario.id);
        info!(
            run = ctx.run_id(),
            scenario = %scenario.id,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            flows = scenario.flows.len(),
            "simulation started"
        );

        let validation = validate_graph(graph);
        if !validation.valid {
            let summary = validation.error_summary();
            warn!(run = ctx.run_id(), errors = validation.errors.len(), "graph validation failed");
            ctx.record(SimEvent::new(
                0,
                SimEventKind::FaultInjected,
                format!("Graph validation failed: {summary}"),
            ));
            return ctx.finish(RunStatus::Failed, build_metrics(graph, Counters::default()), None);
        }

        for warning in validation.warnings {
            ctx.push_finding(warning_finding(warning));
        }

        for fault in &scenario.faults {
            ctx.record(SimEvent::new(
                fault.start_time,
                SimEventKind::FaultInjected,
                format!("Fault injected: {} on {}", fault.kind, fault.target_id),
            ));
        }
        let faulted = apply_faults(graph, &scenario.faults);
        let topology = Topology {
            graph: &faulted,
            adjacency: Adjacency::new(&faulted),
            tags: faulted.node_tags(),
        };

        for flow in &scenario.flows {
            self.simulate_flow(&mut ctx, &topology, flow);
        }
        for event in &scenario.attack_events {
            simulate_attack(&mut ctx, &topology, event);
        }
        for finding in checks::analyze(&faulted) {
            ctx.push_finding(finding);
        }

        let blast = self.blast_report(&faulted);
        let metrics = build_metrics(&faulted, ctx.counters);
        let result = ctx.finish(RunStatus::Completed, metrics, blast);
        info!(
            run = %result.id,
            events = result.events.len(),
            findings = result.findings.len(),
            dropped = result.metrics.packets_dropped,
            "simulation completed"
        );
        result
    }

    fn simulate_flow(&self, ctx: &mut RunContext, topology: &Topology<'_>, flow: &Flow) {
        let started = SimEvent::new(
            ctx.now(),
            SimEventKind::FlowStart,
            format!("Flow started: {} → {} ({})", flow.from, flow.to, flow.protocol),
        );
        ctx.record(started.with_flow(&flow.id));

        let Some(route) = topology.adjacency.find_path(&flow.from, &flow.to) else {
            debug!(flow = %flow.id, "no path");
            let dropped = SimEvent::new(
                ctx.now(),
                SimEventKind::PacketDropped,
                format!("No path found from {} to {}", flow.from, flow.to),
            );
            ctx.record(dropped.with_flow(&flow.id));
            ctx.counters.packets_dropped += 1;
            ctx.push_finding(
                Finding::new(
                    Severity::High,
                    "Unreachable Destination",
                    format!("Node {} cannot reach {}", flow.from, flow.to),
                )
                .with_nodes([flow.from.as_str(), flow.to.as_str()])
                .with_remediation("Add network connectivity or check for failed links"),
            );
            return;
        };

        if let Some(firewall) = firewall_on_path(topology.graph, &route) {
            let decision = self.evaluate(ctx, firewall, flow, &topology.tags);
            ctx.counters.policies_evaluated += 1;
            debug!(flow = %flow.id, firewall = %firewall.id, allowed = decision.allowed, "policy evaluated");

            if !decision.allowed {
                ctx.counters.policies_blocked += 1;
                ctx.counters.packets_dropped += 1;
                let blocked = SimEvent::new(
                    ctx.now(),
                    SimEventKind::PolicyBlock,
                    format!(
                        "Flow blocked by firewall {}: {}",
                        firewall.label, decision.reason
                    ),
                );
                ctx.record(blocked.with_node(&firewall.id).with_flow(&flow.id));
                ctx.push_finding(
                    Finding::new(
                        Severity::Info,
                        "Traffic Blocked by Policy",
                        format!(
                            "Flow from {} to {} was blocked by firewall policy",
                            flow.from, flow.to
                        ),
                    )
                    .with_nodes([firewall.id.as_str()])
                    .with_category("policy-enforcement")
                    .with_evidence(json!({ "flow": flow, "rule": decision.matched_rule })),
                );
                return;
            }
        }

        for node_id in &route.path {
            let sent = SimEvent::new(
                ctx.now(),
                SimEventKind::PacketSent,
                format!("Packet at node {node_id}"),
            );
            ctx.record(sent.with_node(node_id).with_flow(&flow.id));
            ctx.advance(self.config.time_step_ms);
        }
        ctx.counters.packets_processed += 1;

        let ended = SimEvent::new(
            ctx.now(),
            SimEventKind::FlowEnd,
            format!("Flow completed: {} → {}", flow.from, flow.to),
        );
        ctx.record(ended.with_flow(&flow.id));
    }

    fn evaluate(
        &self,
        ctx: &mut RunContext,
        firewall: &Node,
        flow: &Flow,
        tags: &NodeTags,
    ) -> Decision {
        let policy = ctx.policy_for(firewall, &self.config.default_firewall_policy);
        let mut request = EvaluationContext::new(&flow.from, &flow.to, tags).with_protocol(&flow.protocol);
        request.port = flow.port;
        Evaluator::new(policy).evaluate(&request)
    }

    fn blast_report(&self, graph: &Graph) -> Option<BlastRadius> {
        let node_id = self.config.blast_radius_node.as_deref()?;
        match blast_radius(graph, node_id) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(node = node_id, error = %e, "blast radius skipped");
                None
            }
        }
    }
}

fn simulate_attack(ctx: &mut RunContext, topology: &Topology<'_>, event: &AttackEvent) {
    let logged = SimEvent::new(
        event.timestamp,
        SimEventKind::AttackEvent,
        format!("Attack event: {} from {}", event.kind, event.source_node_id),
    );
    ctx.record(
        logged
            .with_node(&event.source_node_id)
            .with_metadata(event.metadata.clone()),
    );

    let verdict = resolve_with(&topology.adjacency, topology.graph, event);
    debug!(attack = %event.id, blocked = verdict.blocked, "attack resolved");
    ctx.push_finding(verdict.finding(event));
}

fn warning_finding(issue: Issue) -> Finding {
    Finding::new(Severity::Medium, "Topology Warning", issue.message)
        .with_nodes(issue.node_id)
        .with_links(issue.link_id)
}

fn build_metrics(graph: &Graph, counters: Counters) -> Metrics {
    let mut metrics = Metrics {
        reachability_matrix: reachability_matrix(graph),
        latency_matrix: latency_matrix(graph),
        ..Metrics::default()
    };
    counters.apply(&mut metrics);
    metrics
}
