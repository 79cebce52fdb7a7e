use crate::conf::types::{RuleConfig, null_as_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seconds a session pin lives when `session_affinity_ttl` is unset.
pub const DEFAULT_SESSION_AFFINITY_TTL: u32 = 82_800;

pub type GeoPools = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u32,

    /// Pool consulted last, when no other pool is eligible.
    pub fallback_pool: String,

    pub default_pools: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub region_pools: GeoPools,

    #[serde(default, deserialize_with = "null_as_default")]
    pub pop_pools: GeoPools,

    #[serde(default, deserialize_with = "null_as_default")]
    pub country_pools: GeoPools,

    #[serde(default)]
    pub proxied: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub session_affinity: SessionAffinity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity_ttl: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity_attributes: Option<SessionAffinityAttributes>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_steering: Option<RandomSteeringConfig>,

    #[serde(default)]
    pub steering_policy: SteeringPolicy,
}

impl LoadBalancerConfig {
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Every pool id this load balancer references, including fallback and geo maps.
    pub fn referenced_pools(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fallback_pool.as_str())
            .chain(self.default_pools.iter().map(String::as_str))
            .chain(
                [&self.region_pools, &self.pop_pools, &self.country_pools]
                    .into_iter()
                    .flat_map(|m| m.values().flatten().map(String::as_str)),
            )
    }
}

/// Algorithm choosing the candidate pool order for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringPolicy {
    /// Maps to `geo` when any geo map has entries, `off` otherwise.
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Off,
    Geo,
    DynamicLatency,
    Random,
    Proximity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAffinity {
    #[default]
    #[serde(alias = "")]
    None,
    Cookie,
    IpCookie,
    Header,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionAffinityAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samesite: Option<SameSite>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<Secure>,

    /// Seconds a drained pin keeps being honoured under `sticky` failover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_duration: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_downtime_failover: Option<ZeroDowntimeFailover>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SameSite {
    #[default]
    Auto,
    Lax,
    None,
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Secure {
    #[default]
    Auto,
    Always,
    Never,
}

/// What happens to a session pin whose origin is drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDowntimeFailover {
    /// The pin is invalidated immediately.
    #[default]
    None,

    /// The pin is honoured only while its origin is healthy again.
    #[serde(alias = "sticky-uptodate")]
    Temporary,

    /// The pin is kept for `drain_duration` seconds regardless of health.
    Sticky,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RandomSteeringConfig {
    /// Weight for pools missing from `pool_weights`. Unset means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_weight: Option<f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_weights: BTreeMap<String, f64>,
}

impl RandomSteeringConfig {
    pub fn weight_of(&self, pool: &str) -> f64 {
        self.pool_weights
            .get(pool)
            .copied()
            .unwrap_or_else(|| self.default_weight.unwrap_or(1.0))
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}
