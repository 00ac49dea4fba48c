//! Firewall policy DSL for Inspector Twin.
//!
//! This crate provides:
//! - A line-oriented rule parser that tolerates malformed lines
//! - A typed rule model (action, protocol, endpoints, port)
//! - First-match-wins, default-deny evaluation against a traffic context
//! - Reference validation against the nodes and tags of a topology
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use twin_policy::{parse, EvaluationContext, Evaluator};
//!
//! let policy = parse("allow tcp from users to web port 443\ndeny any from Any to Any");
//! let tags = HashMap::from([("laptop".to_string(), vec!["users".to_string()])]);
//!
//! let ctx = EvaluationContext::new("laptop", "web", &tags)
//!     .with_protocol("tcp")
//!     .with_port(443);
//! assert!(Evaluator::new(&policy).evaluate(&ctx).allowed);
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod validator;

pub use error::{Error, Result};
pub use evaluator::{Decision, EvaluationContext, Evaluator, NodeTags};
pub use model::{Action, Policy, Port, Rule, SkippedLine};
pub use parser::{parse, parse_rule};
pub use validator::{validate, ValidationReport};
