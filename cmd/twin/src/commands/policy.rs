//! Policy command implementation.

use anyhow::{Context, Result};
use std::fs;
use tracing::{error, info, warn};
use twin_model::loader;
use twin_policy::{EvaluationContext, Evaluator, NodeTags};

/// A single flow to evaluate against the policy.
pub struct FlowQuery {
    /// Source node id.
    pub from: String,
    /// Destination node id.
    pub to: String,
    /// Protocol, if any.
    pub protocol: Option<String>,
    /// Destination port, if any.
    pub port: Option<u16>,
}

/// Runs the policy command.
pub fn run(policy_path: &str, graph_path: Option<&str>, flow: Option<&FlowQuery>) -> Result<()> {
    let source = fs::read_to_string(policy_path)
        .with_context(|| format!("Failed to read policy file: {policy_path}"))?;
    let policy = twin_policy::parse(&source);

    info!("Parsed {} rule(s) from {}", policy.rules.len(), policy_path);
    for (i, rule) in policy.rules.iter().enumerate() {
        info!("  {}. {}", i + 1, rule);
    }
    for skipped in &policy.skipped {
        warn!("Skipped line {}: {}", skipped.line, skipped.text);
    }
    if !policy.has_catch_all() {
        warn!("Policy has no catch-all rule; unmatched traffic falls through to default deny");
    }

    let tags: NodeTags = match graph_path {
        Some(path) => loader::load_graph(path)
            .with_context(|| format!("Failed to load topology: {path}"))?
            .node_tags(),
        None => NodeTags::new(),
    };

    if let Some(query) = flow {
        let mut ctx = EvaluationContext::new(&query.from, &query.to, &tags);
        ctx.protocol = query.protocol.as_deref();
        ctx.port = query.port;
        let decision = Evaluator::new(&policy).evaluate(&ctx);
        let verdict = if decision.allowed { "ALLOW" } else { "DENY" };
        info!("{} {} -> {}: {}", verdict, query.from, query.to, decision.reason);
    }

    if graph_path.is_some() {
        let report = twin_policy::validate(&policy, &tags);
        for message in &report.errors {
            error!("{}", message);
        }
        let count = report.errors.len();
        report
            .into_result()
            .with_context(|| format!("Policy has {count} invalid reference(s)"))?;
        info!("All policy references resolve against the topology");
    }

    Ok(())
}
