//! Typed policy model.
//!
//! A [`Policy`] is an ordered list of [`Rule`]s. Order is significant:
//! evaluation stops at the first rule that matches.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed firewall policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Rules in document order.
    pub rules: Vec<Rule>,
    /// Lines that did not follow the grammar and were dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLine>,
}

/// A single allow/deny rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// What to do with matching traffic.
    pub action: Action,
    /// Protocol filter (`tcp`, `udp`, `icmp`, `dns`, `any`). Unset matches all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Source reference: node id, tag, or `any`.
    pub from: String,
    /// Destination reference: node id, tag, or `any`.
    pub to: String,
    /// Port filter. Unset matches all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Rule action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Let matching traffic through.
    Allow,
    /// Block matching traffic.
    Deny,
}

/// Port filter of a rule.
///
/// Numeric tokens become [`Port::Number`]; anything else is kept verbatim and
/// read as an inclusive `start-end` range (or a single number) at match time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    /// Exact port.
    Number(u16),
    /// Range or otherwise non-numeric token, e.g. `"80-443"`.
    Range(String),
}

/// A policy line that was dropped during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// Line number in the source document (1-based).
    pub line: usize,
    /// Trimmed line content.
    pub text: String,
}

impl Policy {
    /// Creates an empty policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules keep insertion order.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Returns true if the policy has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if some rule matches every source and destination.
    #[must_use]
    pub fn has_catch_all(&self) -> bool {
        self.rules
            .iter()
            .any(|r| is_any(&r.from) && is_any(&r.to) && r.protocol_is_wildcard() && r.port.is_none())
    }
}

impl Rule {
    /// Creates a rule with no protocol or port filter.
    #[must_use]
    pub fn new(action: Action, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            action,
            protocol: None,
            from: from.into(),
            to: to.into(),
            port: None,
            comment: None,
        }
    }

    /// Sets the protocol filter (stored lowercase).
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into().to_lowercase());
        self
    }

    /// Sets the port filter.
    #[must_use]
    pub fn with_port(mut self, port: Port) -> Self {
        self.port = Some(port);
        self
    }

    /// Returns true if the rule does not restrict protocol.
    #[must_use]
    pub fn protocol_is_wildcard(&self) -> bool {
        self.protocol.as_deref().map_or(true, is_any)
    }
}

impl Port {
    /// Builds a port filter from a DSL token.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        token
            .parse::<u16>()
            .map_or_else(|_| Self::Range(token.to_string()), Self::Number)
    }

    /// Returns the inclusive `(start, end)` bounds of this filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPort`] if a range token does not parse.
    pub fn bounds(&self) -> Result<(u16, u16)> {
        match self {
            Self::Number(p) => Ok((*p, *p)),
            Self::Range(s) => {
                let invalid = |reason: &str| Error::InvalidPort {
                    port: s.clone(),
                    reason: reason.to_string(),
                };
                let parts: Vec<&str> = s.split('-').collect();
                if let [start, end] = parts.as_slice() {
                    let start: u16 = start
                        .trim()
                        .parse()
                        .map_err(|_| invalid("range start is not a port number"))?;
                    let end: u16 = end
                        .trim()
                        .parse()
                        .map_err(|_| invalid("range end is not a port number"))?;
                    Ok((start, end))
                } else {
                    let p: u16 = s
                        .trim()
                        .parse()
                        .map_err(|_| invalid("expected a port number or 'start-end'"))?;
                    Ok((p, p))
                }
            }
        }
    }

    /// Returns true if `port` falls within this filter.
    ///
    /// Malformed range tokens match nothing.
    #[must_use]
    pub fn matches(&self, port: u16) -> bool {
        self.bounds()
            .is_ok_and(|(start, end)| port >= start && port <= end)
    }
}

/// Returns true if a reference or protocol is the `any` wildcard.
pub(crate) fn is_any(value: &str) -> bool {
    value.eq_ignore_ascii_case("any")
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(p) => write!(f, "{p}"),
            Self::Range(s) => write!(f, "{s}"),
        }
    }
}

/// Renders the rule as a DSL line.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action)?;
        if let Some(protocol) = &self.protocol {
            write!(f, " {protocol}")?;
        }
        write!(f, " from {} to {}", self.from, self.to)?;
        if let Some(port) = &self.port {
            write!(f, " port {port}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_from_token() {
        assert_eq!(Port::from_token("443"), Port::Number(443));
        assert_eq!(Port::from_token("80-443"), Port::Range("80-443".to_string()));
        assert_eq!(Port::from_token("70000"), Port::Range("70000".to_string()));
    }

    #[test]
    fn port_range_is_inclusive() {
        let range = Port::Range("80-443".to_string());
        assert!(range.matches(80));
        assert!(range.matches(443));
        assert!(range.matches(200));
        assert!(!range.matches(79));
        assert!(!range.matches(444));
    }

    #[test]
    fn malformed_range_matches_nothing() {
        let range = Port::Range("http".to_string());
        assert!(!range.matches(80));
        assert!(matches!(range.bounds(), Err(Error::InvalidPort { .. })));
    }

    #[test]
    fn port_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Port::Number(22),
            Port::Range("1000-2000".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[22,"1000-2000"]"#);
    }

    #[test]
    fn catch_all_detection() {
        let mut policy = Policy::new();
        policy.add_rule(Rule::new(Action::Allow, "users", "web").with_protocol("tcp"));
        assert!(!policy.has_catch_all());

        policy.add_rule(Rule::new(Action::Deny, "Any", "any"));
        assert!(policy.has_catch_all());
    }

    #[test]
    fn rule_display_renders_dsl() {
        let rule = Rule::new(Action::Allow, "n1", "n2")
            .with_protocol("TCP")
            .with_port(Port::Number(443));
        insta::assert_snapshot!(rule.to_string(), @"allow tcp from n1 to n2 port 443");

        let rule = Rule::new(Action::Deny, "guest", "Any");
        insta::assert_snapshot!(rule.to_string(), @"deny from guest to Any");
    }
}
