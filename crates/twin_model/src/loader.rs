//! Boundary loading of topology and scenario documents.
//!
//! Documents are deserialized into typed values and then schema-checked, so
//! everything past this module works with well-formed input.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::scenario::Scenario;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Document encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl Format {
    /// Picks a format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] for anything but `.json`, `.yaml`, `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(Error::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Parses a topology document and checks its schema.
///
/// # Errors
///
/// Returns an error if the document does not deserialize or violates the schema.
pub fn parse_graph(content: &str, format: Format) -> Result<Graph> {
    let graph: Graph = decode(content, format)?;
    graph.check_schema()?;
    debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "Parsed topology"
    );
    Ok(graph)
}

/// Parses a scenario document and checks its schema.
///
/// # Errors
///
/// Returns an error if the document does not deserialize or violates the schema.
pub fn parse_scenario(content: &str, format: Format) -> Result<Scenario> {
    let scenario: Scenario = decode(content, format)?;
    scenario.check_schema()?;
    debug!(
        flows = scenario.flows.len(),
        faults = scenario.faults.len(),
        attacks = scenario.attack_events.len(),
        "Parsed scenario"
    );
    Ok(scenario)
}

/// Loads a topology from a `.json`, `.yaml` or `.yml` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails schema checks.
pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let graph = parse_graph(&fs::read_to_string(path)?, Format::from_path(path)?)?;
    info!("Loaded topology from {}", path.display());
    Ok(graph)
}

/// Loads a scenario from a `.json`, `.yaml` or `.yml` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails schema checks.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario> {
    let path = path.as_ref();
    let scenario = parse_scenario(&fs::read_to_string(path)?, Format::from_path(path)?)?;
    info!("Loaded scenario '{}' from {}", scenario.name, path.display());
    Ok(scenario)
}

fn decode<T: DeserializeOwned>(content: &str, format: Format) -> Result<T> {
    match format {
        Format::Json => Ok(serde_json::from_str(content)?),
        Format::Yaml => Ok(serde_yaml::from_str(content)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;
    use crate::scenario::FaultKind;

    const GRAPH_JSON: &str = r#"{
        "nodes": [
            {"id": "r1", "type": "router", "label": "R1", "position": {"x": 0, "y": 0}},
            {"id": "s1", "type": "server", "label": "S1", "tags": ["public"], "position": {"x": 1, "y": 0}}
        ],
        "links": [
            {"id": "l1", "source": "r1", "target": "s1", "type": "ethernet", "latency": 1}
        ]
    }"#;

    const SCENARIO_YAML: &str = r"
id: sc1
name: Link failure
topologyId: t1
flows:
  - id: f1
    from: r1
    to: s1
    protocol: tcp
    port: 443
faults:
  - id: x1
    type: link-down
    targetId: l1
";

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/topology.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("scenario.YML")).unwrap(), Format::Yaml);
        assert!(matches!(
            Format::from_path(Path::new("topology.toml")),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn parse_json_graph() {
        let graph = parse_graph(GRAPH_JSON, Format::Json).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].node_type, NodeType::Server);
        assert!((graph.links[0].latency - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_yaml_scenario() {
        let scenario = parse_scenario(SCENARIO_YAML, Format::Yaml).unwrap();
        assert_eq!(scenario.flows[0].port, Some(443));
        assert_eq!(scenario.faults[0].kind, FaultKind::LinkDown);
    }

    #[test]
    fn schema_violation_surfaces_at_boundary() {
        let bad = GRAPH_JSON.replace(r#""latency": 1"#, r#""latency": 1, "loss": 150"#);
        assert!(matches!(parse_graph(&bad, Format::Json), Err(Error::Schema(_))));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            parse_graph("{\"nodes\": 3}", Format::Json),
            Err(Error::Json(_))
        ));
    }
}
