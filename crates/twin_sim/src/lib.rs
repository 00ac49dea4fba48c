//! Network digital-twin simulation engine for Inspector Twin.
//!
//! Given a topology, a scenario and per-firewall policies, the engine
//! computes reachability, simulates flow delivery, enforces policy at
//! firewalls, resolves attack events and reports security findings.
//!
//! # Pipeline
//!
//! - **Validate**: duplicate ids and dangling links abort the run
//! - **Fault-inject**: faults are applied to a copy of the topology
//! - **Simulate flows**: route, enforce policy, emit events
//! - **Simulate attacks**: reachability and firewall placement decide
//! - **Static checks**: TLS exposure and admin/guest adjacency
//!
//! # Example
//!
//! ```rust
//! use twin_model::fixtures;
//! use twin_sim::Engine;
//!
//! let engine = Engine::default();
//! let result = engine.simulate(&fixtures::office(), &fixtures::office_scenario());
//! assert!(result.is_completed());
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod attack;
pub mod blast;
pub mod checks;
pub mod config;
mod context;
pub mod engine;
pub mod error;
pub mod faults;
pub mod routing;
pub mod validation;

pub use attack::{firewall_on_path, resolve_attack, AttackVerdict};
pub use blast::blast_radius;
pub use config::SimConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use faults::apply_faults;
pub use routing::{find_path, latency_matrix, path_latency, reachability_matrix, Adjacency, Route};
pub use validation::{validate_graph, Issue, ValidationReport};
