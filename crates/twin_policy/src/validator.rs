//! Reference validation of a policy against a topology.

use crate::error::{Error, Result};
use crate::evaluator::NodeTags;
use crate::model::{is_any, Policy, Port};
use serde::{Deserialize, Serialize};

/// Result of validating a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `errors` is empty.
    pub valid: bool,
    /// One message per problem, in rule order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Converts the report into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every problem when invalid.
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::Validation(self.errors.join("; ")))
        }
    }
}

/// Checks that every rule refers to known nodes or tags and uses sensible
/// protocol/port combinations.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use twin_policy::{parse, validate};
///
/// let tags = HashMap::from([("web".to_string(), vec!["dmz".to_string()])]);
/// let report = validate(&parse("allow tcp from dmz to ghost"), &tags);
/// assert!(!report.valid);
/// assert_eq!(report.errors, vec!["Invalid destination reference: ghost"]);
/// ```
pub fn validate(policy: &Policy, node_tags: &NodeTags) -> ValidationReport {
    let mut errors = Vec::new();

    for rule in &policy.rules {
        if !is_any(&rule.from) && !is_known_reference(&rule.from, node_tags) {
            errors.push(format!("Invalid source reference: {}", rule.from));
        }
        if !is_any(&rule.to) && !is_known_reference(&rule.to, node_tags) {
            errors.push(format!("Invalid destination reference: {}", rule.to));
        }

        if let Some(port) = &rule.port {
            if rule.protocol.as_deref() == Some("icmp") {
                errors.push("ICMP protocol does not support port specification".to_string());
            }
            if let (Port::Range(_), Err(e)) = (port, port.bounds()) {
                errors.push(e.to_string());
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn is_known_reference(reference: &str, node_tags: &NodeTags) -> bool {
    node_tags.contains_key(reference)
        || node_tags
            .values()
            .any(|tags| tags.iter().any(|t| t == reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::HashMap;

    fn tags() -> NodeTags {
        HashMap::from([
            ("fw1".to_string(), vec!["security".to_string()]),
            ("web".to_string(), vec!["dmz".to_string()]),
        ])
    }

    #[test]
    fn valid_policy() {
        let policy = parse("allow tcp from Any to web port 443\ndeny any from dmz to fw1");
        let report = validate(&policy, &tags());
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn unknown_references() {
        let policy = parse("allow tcp from nobody to nowhere");
        let report = validate(&policy, &tags());
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Invalid source reference: nobody",
                "Invalid destination reference: nowhere",
            ]
        );
    }

    #[test]
    fn icmp_with_port() {
        let policy = parse("allow icmp from web to fw1 port 7");
        let report = validate(&policy, &tags());
        assert_eq!(
            report.errors,
            vec!["ICMP protocol does not support port specification"]
        );
    }

    #[test]
    fn malformed_port_range() {
        let policy = parse("allow tcp from web to fw1 port 80-high");
        let report = validate(&policy, &tags());
        assert!(!report.valid);
        assert!(report.errors[0].starts_with("invalid port '80-high'"));
    }

    #[test]
    fn into_result_joins_errors() {
        let policy = parse("allow from a to b");
        let err = validate(&policy, &tags()).into_result().unwrap_err();
        assert_eq!(
            err,
            Error::Validation(
                "Invalid source reference: a; Invalid destination reference: b".to_string()
            )
        );
        assert!(validate(&parse("deny any from Any to Any"), &tags()).into_result().is_ok());
    }
}
