//! Network topology and simulation model for Inspector Twin.
//!
//! This crate provides:
//! - Nodes, links and graphs describing a network
//! - Scenarios: traffic flows, injected faults, attack events
//! - Run results: events, metrics and security findings
//! - Boundary loading of JSON/YAML documents with schema checks
//!
//! All types serialize to the camelCase JSON exchanged with the persistence
//! and report collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use twin_model::loader;
//!
//! let graph = loader::load_graph("topology.json")?;
//! let scenario = loader::load_scenario("scenario.yaml")?;
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod fixtures;
pub mod graph;
pub mod loader;
pub mod result;
pub mod scenario;

pub use error::{Error, Result};
pub use graph::{Graph, GraphMetadata, Interface, Link, LinkType, Node, NodeType, Position, Severity};
pub use result::{
    BlastRadius, Finding, Metrics, RunResult, RunStatus, SimEvent, SimEventKind,
};
pub use scenario::{AttackEvent, AttackKind, Fault, FaultKind, FaultParams, Flow, Scenario};
