//! Validate command implementation.

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use twin_model::loader;
use twin_sim::validate_graph;

/// Runs the validate command.
pub fn run(graph_path: &str) -> Result<()> {
    info!("Validating topology: {}", graph_path);

    let graph = loader::load_graph(graph_path)
        .with_context(|| format!("Failed to load topology: {graph_path}"))?;
    let report = validate_graph(&graph);

    for issue in &report.errors {
        error!("{}", issue.message);
    }
    for issue in &report.warnings {
        warn!("{}", issue.message);
    }

    if !report.valid {
        anyhow::bail!("Topology is invalid: {} error(s)", report.errors.len());
    }

    info!(
        "Topology is valid: {} node(s), {} link(s), {} warning(s)",
        graph.nodes.len(),
        graph.links.len(),
        report.warnings.len()
    );
    Ok(())
}
