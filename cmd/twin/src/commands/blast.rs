//! Blast command implementation.

use anyhow::{Context, Result};
use tracing::info;
use twin_model::loader;
use twin_sim::blast_radius;

/// Runs the blast command.
pub fn run(graph_path: &str, node_id: &str) -> Result<()> {
    let graph = loader::load_graph(graph_path)
        .with_context(|| format!("Failed to load topology: {graph_path}"))?;

    let report = blast_radius(&graph, node_id)
        .with_context(|| format!("Failed to compute blast radius for {node_id}"))?;

    info!(
        "Compromising {} affects {} node(s) and {} link(s), impact score {}",
        report.compromised_node_id,
        report.affected_node_ids.len(),
        report.affected_link_ids.len(),
        report.impact_score
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}
