//! Policy evaluation.
//!
//! Rules are tested in document order and the first match decides. When no
//! rule matches, traffic is denied.

use crate::model::{is_any, Action, Policy, Rule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tags carried by each node, keyed by node id.
pub type NodeTags = HashMap<String, Vec<String>>;

/// Reason reported when no rule matches.
pub const DEFAULT_DENY_REASON: &str = "No matching policy rule (default deny)";

/// Traffic being checked against a policy.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    /// Originating node id.
    pub source_node_id: &'a str,
    /// Destination node id.
    pub dest_node_id: &'a str,
    /// Traffic protocol, if known.
    pub protocol: Option<&'a str>,
    /// Destination port, if known.
    pub port: Option<u16>,
    /// Tag lookup for group references.
    pub node_tags: &'a NodeTags,
}

/// Outcome of evaluating a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Whether the traffic is let through.
    pub allowed: bool,
    /// The rule that decided, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<Rule>,
    /// Human-readable explanation.
    pub reason: String,
}

/// Evaluates contexts against a borrowed policy.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'p> {
    policy: &'p Policy,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context with no protocol or port.
    #[must_use]
    pub const fn new(source: &'a str, dest: &'a str, node_tags: &'a NodeTags) -> Self {
        Self {
            source_node_id: source,
            dest_node_id: dest,
            protocol: None,
            port: None,
            node_tags,
        }
    }

    /// Sets the protocol.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: &'a str) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

impl Decision {
    fn default_deny() -> Self {
        Self {
            allowed: false,
            matched_rule: None,
            reason: DEFAULT_DENY_REASON.to_string(),
        }
    }

    fn matched(rule: &Rule) -> Self {
        Self {
            allowed: rule.action == Action::Allow,
            matched_rule: Some(rule.clone()),
            reason: format!(
                "Matched rule: {} from {} to {}",
                rule.action, rule.from, rule.to
            ),
        }
    }
}

impl<'p> Evaluator<'p> {
    /// Creates an evaluator for the given policy.
    #[must_use]
    pub const fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// Evaluates a context. First matching rule wins; no match denies.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Decision {
        self.policy
            .rules
            .iter()
            .find(|rule| rule_matches(rule, ctx))
            .map_or_else(Decision::default_deny, Decision::matched)
    }
}

fn rule_matches(rule: &Rule, ctx: &EvaluationContext<'_>) -> bool {
    if !ref_matches(&rule.from, ctx.source_node_id, ctx.node_tags) {
        return false;
    }
    if !ref_matches(&rule.to, ctx.dest_node_id, ctx.node_tags) {
        return false;
    }

    if !rule.protocol_is_wildcard() {
        let wanted = rule.protocol.as_deref().unwrap_or_default();
        match ctx.protocol {
            Some(p) if p.eq_ignore_ascii_case(wanted) => {}
            _ => return false,
        }
    }

    match (&rule.port, ctx.port) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(filter), Some(port)) => filter.matches(port),
    }
}

/// `any` matches everything; otherwise the reference must be the node id or
/// one of the node's tags.
fn ref_matches(reference: &str, node_id: &str, node_tags: &NodeTags) -> bool {
    if is_any(reference) || reference == node_id {
        return true;
    }
    node_tags
        .get(node_id)
        .is_some_and(|tags| tags.iter().any(|t| t == reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn tags() -> NodeTags {
        HashMap::from([
            ("n1".to_string(), vec!["users".to_string()]),
            ("n2".to_string(), vec!["servers".to_string(), "public".to_string()]),
            ("n3".to_string(), vec![]),
        ])
    }

    #[test]
    fn allows_matching_context() {
        let policy = parse("allow tcp from n1 to n2 port 443");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags)
            .with_protocol("tcp")
            .with_port(443);

        let decision = Evaluator::new(&policy).evaluate(&ctx);
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Matched rule: allow from n1 to n2");
        assert_eq!(decision.matched_rule, Some(policy.rules[0].clone()));
    }

    #[test]
    fn denies_different_port() {
        let policy = parse("allow tcp from n1 to n2 port 443");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags)
            .with_protocol("tcp")
            .with_port(80);

        let decision = Evaluator::new(&policy).evaluate(&ctx);
        assert!(!decision.allowed);
        assert!(decision.matched_rule.is_none());
        assert_eq!(decision.reason, DEFAULT_DENY_REASON);
    }

    #[test]
    fn empty_policy_denies_everything() {
        let policy = Policy::new();
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("udp");

        insta::assert_snapshot!(
            Evaluator::new(&policy).evaluate(&ctx).reason,
            @"No matching policy rule (default deny)"
        );
    }

    #[test]
    fn first_match_wins_over_later_allow() {
        let policy = parse("deny any from n1 to n2\nallow tcp from n1 to n2 port 443");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags)
            .with_protocol("tcp")
            .with_port(443);

        let decision = Evaluator::new(&policy).evaluate(&ctx);
        assert!(!decision.allowed);
        assert_eq!(decision.matched_rule.unwrap().action, Action::Deny);
    }

    #[test]
    fn tag_references_match() {
        let policy = parse("allow tcp from users to public");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("tcp");
        assert!(Evaluator::new(&policy).evaluate(&ctx).allowed);

        let ctx = EvaluationContext::new("n3", "n2", &tags).with_protocol("tcp");
        assert!(!Evaluator::new(&policy).evaluate(&ctx).allowed);
    }

    #[test]
    fn any_reference_is_case_insensitive() {
        let policy = parse("allow from ANY to any");
        let tags = tags();
        let ctx = EvaluationContext::new("x", "y", &tags);
        assert!(Evaluator::new(&policy).evaluate(&ctx).allowed);
    }

    #[test]
    fn protocol_match_is_case_insensitive() {
        let policy = parse("allow tcp from n1 to n2");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("TCP");
        assert!(Evaluator::new(&policy).evaluate(&ctx).allowed);

        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("udp");
        assert!(!Evaluator::new(&policy).evaluate(&ctx).allowed);

        // A protocol-restricted rule never matches unknown protocol.
        let ctx = EvaluationContext::new("n1", "n2", &tags);
        assert!(!Evaluator::new(&policy).evaluate(&ctx).allowed);
    }

    #[test]
    fn port_rule_requires_context_port() {
        let policy = parse("allow tcp from n1 to n2 port 22");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("tcp");
        assert!(!Evaluator::new(&policy).evaluate(&ctx).allowed);
    }

    #[test]
    fn port_range_rule() {
        let policy = parse("allow tcp from n1 to n2 port 8000-8080");
        let tags = tags();
        let eval = Evaluator::new(&policy);

        let inside = EvaluationContext::new("n1", "n2", &tags)
            .with_protocol("tcp")
            .with_port(8080);
        let outside = EvaluationContext::new("n1", "n2", &tags)
            .with_protocol("tcp")
            .with_port(9000);
        assert!(eval.evaluate(&inside).allowed);
        assert!(!eval.evaluate(&outside).allowed);
    }

    #[test]
    fn explicit_deny_reports_matched_rule() {
        let policy = parse("deny any from Any to Any");
        let tags = tags();
        let ctx = EvaluationContext::new("n1", "n2", &tags).with_protocol("tcp");

        let decision = Evaluator::new(&policy).evaluate(&ctx);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Matched rule: deny from Any to Any");
    }
}
