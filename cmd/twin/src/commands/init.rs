//! Init command implementation.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;
use twin_model::fixtures;

/// Runs the init command.
pub fn run(path: &str) -> Result<()> {
    let project_path = Path::new(path);

    info!("Initializing Inspector Twin project at: {}", project_path.display());

    fs::create_dir_all(project_path)
        .with_context(|| format!("Failed to create {}", project_path.display()))?;

    let topology = serde_json::to_value(fixtures::office()).context("Failed to encode topology")?;
    write_sample(project_path, "topology.json", &topology)?;

    let scenario =
        serde_json::to_value(fixtures::office_scenario()).context("Failed to encode scenario")?;
    write_sample(project_path, "scenario.json", &scenario)?;

    let policy_path = project_path.join("perimeter.policy");
    if policy_path.exists() {
        info!("Skipped: {} (already exists)", policy_path.display());
    } else {
        fs::write(&policy_path, fixtures::OFFICE_POLICY)
            .with_context(|| format!("Failed to create {}", policy_path.display()))?;
        info!("Created: {}", policy_path.display());
    }

    info!("Next steps:");
    info!("  1. Edit topology.json and scenario.json");
    info!("  2. Run: twin validate --graph topology.json");
    info!("  3. Run: twin simulate --graph topology.json --scenario scenario.json");

    Ok(())
}

fn write_sample(dir: &Path, name: &str, value: &Value) -> Result<()> {
    let path = dir.join(name);
    if path.exists() {
        info!("Skipped: {} (already exists)", path.display());
        return Ok(());
    }
    let json = serde_json::to_string_pretty(value).context("Failed to format JSON")?;
    fs::write(&path, json).with_context(|| format!("Failed to create {}", path.display()))?;
    info!("Created: {}", path.display());
    Ok(())
}
