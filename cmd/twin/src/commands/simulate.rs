//! Simulate command implementation.

use anyhow::{Context, Result};
use std::fs;
use tracing::{error, info, warn};
use twin_model::{loader, RunResult, Severity};
use twin_sim::{Engine, SimConfig};

/// Runs the simulate command.
pub fn run(
    graph_path: &str,
    scenario_path: &str,
    output: Option<&str>,
    config: SimConfig,
    fail_on: Option<Severity>,
) -> Result<()> {
    info!("Topology: {}", graph_path);
    info!("Scenario: {}", scenario_path);

    let graph = loader::load_graph(graph_path)
        .with_context(|| format!("Failed to load topology: {graph_path}"))?;
    let scenario = loader::load_scenario(scenario_path)
        .with_context(|| format!("Failed to load scenario: {scenario_path}"))?;

    let result = Engine::new(config).simulate(&graph, &scenario);

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize run result")?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
            info!("Wrote run result to {}", path);
        }
        None => println!("{json}"),
    }

    report(&result);

    if !result.is_completed() {
        let reason = result.events.first().map_or("", |e| e.message.as_str());
        anyhow::bail!("Simulation failed: {reason}");
    }

    if let Some(threshold) = fail_on {
        let count = result.findings_at_least(threshold).count();
        if count > 0 {
            anyhow::bail!("{count} finding(s) at or above {threshold}");
        }
    }

    Ok(())
}

fn report(result: &RunResult) {
    let m = &result.metrics;
    info!(
        "Run {} {}: {} event(s), {} finding(s)",
        result.id,
        result.status,
        result.events.len(),
        result.findings.len()
    );
    info!(
        "Packets processed/dropped: {}/{}, policies evaluated/blocked: {}/{}",
        m.packets_processed, m.packets_dropped, m.policies_evaluated, m.policies_blocked
    );

    for finding in &result.findings {
        match finding.severity {
            Severity::Critical | Severity::High => {
                error!("[{}] {}: {}", finding.severity, finding.title, finding.description);
            }
            Severity::Medium => {
                warn!("[{}] {}: {}", finding.severity, finding.title, finding.description);
            }
            Severity::Low | Severity::Info => {
                info!("[{}] {}: {}", finding.severity, finding.title, finding.description);
            }
        }
    }

    if let Some(blast) = &result.blast_radius {
        info!(
            "Blast radius of {}: {} node(s), impact score {}",
            blast.compromised_node_id,
            blast.affected_node_ids.len(),
            blast.impact_score
        );
    }
}
