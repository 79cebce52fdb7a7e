use crate::conf::types::{
    GeoPools, RandomSteeringConfig, SameSite, Secure, SessionAffinity, SteeringPolicy,
    ZeroDowntimeFailover,
};
use serde::{Deserialize, Serialize};

/// A priority-ordered conditional override applied before steering.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub overrides: RuleOverrides,

    /// Only used for human readability.
    pub name: String,

    /// Expression evaluated outside the engine. Empty always matches.
    #[serde(default)]
    pub condition: String,

    /// Lowest value runs first.
    #[serde(default)]
    pub priority: i32,

    /// Respond directly instead of routing. Implies `terminates`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_response: Option<FixedResponse>,

    #[serde(default)]
    pub disabled: bool,

    /// No further rules run after this one matches.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub terminates: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FixedResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message_body: String,

    /// Zero means 200.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub status_code: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
}

impl FixedResponse {
    pub fn effective_status(&self) -> u16 {
        if self.status_code == 0 {
            200
        } else {
            self.status_code
        }
    }
}

/// Load balancer fields a rule may replace. Absent fields are inherited.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<SessionAffinity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity_ttl: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity_attributes: Option<RuleSessionAffinityAttributes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering_policy: Option<SteeringPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_pool: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pools: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop_pools: Option<GeoPools>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_pools: Option<GeoPools>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_pools: Option<GeoPools>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_steering: Option<RandomSteeringConfig>,
}

impl RuleOverrides {
    pub fn referenced_pools(&self) -> impl Iterator<Item = &str> {
        self.fallback_pool
            .iter()
            .map(String::as_str)
            .chain(self.default_pools.iter().flatten().map(String::as_str))
            .chain(
                [&self.region_pools, &self.pop_pools, &self.country_pools]
                    .into_iter()
                    .flatten()
                    .flat_map(|m| m.values().flatten().map(String::as_str)),
            )
    }
}

/// Session affinity attributes without `drain_duration`, which rules cannot override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleSessionAffinityAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samesite: Option<SameSite>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<Secure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_downtime_failover: Option<ZeroDowntimeFailover>,
}

fn is_zero(v: &u16) -> bool {
    *v == 0
}
