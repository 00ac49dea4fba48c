//! Policy DSL parser.
//!
//! Parses line-oriented firewall rules into a [`Policy`].
//!
//! # Grammar
//!
//! ```text
//! <allow|deny> [<tcp|udp|icmp|dns|any>] from <ref> to <ref> [port <port-or-range>]
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. A line that does not
//! match the grammar is dropped with a warning; it never aborts the document.
//!
//! ```text
//! # web tier
//! allow tcp from users to webapp port 443
//! allow dns from Any to dns1
//! deny any from guest to Any
//! ```

use crate::error::{Error, Result};
use crate::model::{Action, Policy, Port, Rule, SkippedLine};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Single-line rule pattern. Trailing text after the last token is ignored.
static RULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(allow|deny)\s+(?:(tcp|udp|icmp|dns|any)\s+)?from\s+(\S+)\s+to\s+(\S+)(?:\s+port\s+(\S+))?",
    )
    .expect("rule pattern is a valid regex")
});

/// Parses a policy document.
///
/// Malformed lines are recorded in [`Policy::skipped`] and logged; the
/// returned policy holds every rule that did parse, in document order.
///
/// # Example
///
/// ```rust
/// use twin_policy::{parse, Action};
///
/// let policy = parse("allow tcp from n1 to n2 port 443\nnonsense\ndeny any from Any to Any");
/// assert_eq!(policy.rules.len(), 2);
/// assert_eq!(policy.rules[1].action, Action::Deny);
/// assert_eq!(policy.skipped.len(), 1);
/// ```
pub fn parse(input: &str) -> Policy {
    let mut policy = Policy::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_rule(line) {
            Ok(rule) => policy.add_rule(rule),
            Err(e) => {
                warn!(line = idx + 1, "Failed to parse policy line: {line} ({e})");
                policy.skipped.push(SkippedLine {
                    line: idx + 1,
                    text: line.to_string(),
                });
            }
        }
    }

    policy
}

/// Parses a single rule line.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the line does not follow the rule grammar.
/// The reported line number is always 1; [`parse`] tracks document lines.
pub fn parse_rule(line: &str) -> Result<Rule> {
    let line = line.trim();
    let caps = RULE_PATTERN.captures(line).ok_or_else(|| Error::Parse {
        line: 1,
        reason: "expected '<allow|deny> [protocol] from <ref> to <ref> [port <port>]'"
            .to_string(),
    })?;

    let action = if caps[1].eq_ignore_ascii_case("allow") {
        Action::Allow
    } else {
        Action::Deny
    };

    let mut rule = Rule::new(action, &caps[3], &caps[4]);
    if let Some(protocol) = caps.get(2) {
        rule = rule.with_protocol(protocol.as_str());
    }
    if let Some(port) = caps.get(5) {
        rule = rule.with_port(Port::from_token(port.as_str()));
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_full_rule() {
        let rule = parse_rule("allow tcp from n1 to n2 port 443").unwrap();
        assert_eq!(rule.action, Action::Allow);
        assert_eq!(rule.protocol.as_deref(), Some("tcp"));
        assert_eq!(rule.from, "n1");
        assert_eq!(rule.to, "n2");
        assert_eq!(rule.port, Some(Port::Number(443)));
    }

    #[test]
    fn parse_without_protocol_or_port() {
        let rule = parse_rule("deny from guest to internal").unwrap();
        assert_eq!(rule.action, Action::Deny);
        assert_eq!(rule.protocol, None);
        assert_eq!(rule.port, None);
    }

    #[test]
    fn parse_is_case_insensitive_on_keywords() {
        let rule = parse_rule("ALLOW UDP FROM Users TO DNS PORT 53").unwrap();
        assert_eq!(rule.action, Action::Allow);
        assert_eq!(rule.protocol.as_deref(), Some("udp"));
        // References keep their case.
        assert_eq!(rule.from, "Users");
        assert_eq!(rule.to, "DNS");
    }

    #[test]
    fn parse_port_range_kept_as_string() {
        let rule = parse_rule("allow tcp from a to b port 8000-8100").unwrap();
        assert_eq!(rule.port, Some(Port::Range("8000-8100".to_string())));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_rule("permit everything"),
            Err(Error::Parse { .. })
        ));
        assert!(parse_rule("allow tcp from n1").is_err());
    }

    #[test]
    fn parse_document_skips_comments_and_blanks() {
        let input = "
# header comment

allow tcp from users to web port 443
   # indented comment
deny any from Any to Any
";
        let policy = parse(input);
        assert_eq!(policy.rules.len(), 2);
        assert!(policy.skipped.is_empty());
    }

    #[test]
    fn parse_document_tolerates_malformed_lines() {
        let input = "allow tcp from a to b\nthis is not a rule\ndeny any from Any to Any";
        let policy = parse(input);

        assert_eq!(policy.rules.len(), 2);
        assert_eq!(
            policy.skipped,
            vec![SkippedLine {
                line: 2,
                text: "this is not a rule".to_string(),
            }]
        );
    }

    #[test]
    fn parse_preserves_document_order() {
        let policy = parse("deny any from n1 to n2\nallow tcp from n1 to n2 port 443");
        assert_eq!(policy.rules[0].action, Action::Deny);
        assert_eq!(policy.rules[1].action, Action::Allow);
    }

    #[test]
    fn parse_empty_document() {
        assert!(parse("").is_empty());
        assert!(parse("\n# only comments\n").is_empty());
    }

    proptest! {
        #[test]
        fn parse_never_panics(input in "\\PC*") {
            let policy = parse(&input);
            let non_blank = input
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .count();
            prop_assert_eq!(policy.rules.len() + policy.skipped.len(), non_blank);
        }

        #[test]
        fn well_formed_lines_render_back(
            action in prop_oneof![Just("allow"), Just("deny")],
            protocol in prop_oneof![Just("tcp"), Just("udp"), Just("dns"), Just("any")],
            from in "[a-z][a-z0-9-]{0,8}",
            to in "[a-z][a-z0-9-]{0,8}",
            port in 1u16..,
        ) {
            let line = format!("{action} {protocol} from {from} to {to} port {port}");
            let rule = parse_rule(&line).unwrap();
            prop_assert_eq!(rule.port.clone(), Some(Port::Number(port)));
            prop_assert_eq!(rule.to_string(), line);
        }
    }
}
