//! Engine configuration.

/// Policy applied to firewalls that carry no `policy` property.
pub const DEFAULT_FIREWALL_POLICY: &str = "deny any from Any to Any";

/// Configuration for the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Clock advance per packet event, in milliseconds. Cosmetic only.
    pub time_step_ms: u64,
    /// DSL used for firewalls lacking a `properties.policy` string.
    pub default_firewall_policy: String,
    /// Node whose blast radius is attached to the run result.
    pub blast_radius_node: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_step_ms: 10,
            default_firewall_policy: DEFAULT_FIREWALL_POLICY.to_string(),
            blast_radius_node: None,
        }
    }
}

impl SimConfig {
    /// Sets the per-packet clock step.
    #[must_use]
    pub const fn with_time_step(mut self, ms: u64) -> Self {
        self.time_step_ms = ms;
        self
    }

    /// Sets the fallback firewall policy.
    #[must_use]
    pub fn with_default_policy(mut self, dsl: impl Into<String>) -> Self {
        self.default_firewall_policy = dsl.into();
        self
    }

    /// Requests a blast-radius report for `node_id`.
    #[must_use]
    pub fn with_blast_radius(mut self, node_id: impl Into<String>) -> Self {
        self.blast_radius_node = Some(node_id.into());
        self
    }
}
