use crate::conf::types::null_as_default;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pool of origins behind one logical service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: String,

    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Healthy-origin threshold below which the pool is degraded. Zero means 1.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub minimum_origins: u32,

    /// Monitor id. Pools without a monitor are never probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub origins: Vec<OriginConfig>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notification_email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_shedding: Option<LoadSheddingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_steering: Option<OriginSteeringConfig>,

    /// Regions health checks run from, e.g. "WNAM", "WEU". Empty means all regions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub check_regions: Vec<String>,
}

impl PoolConfig {
    /// Identity used by load balancers to reference this pool.
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    pub fn effective_minimum_origins(&self) -> usize {
        self.minimum_origins.max(1) as usize
    }

    pub fn origin_steering_policy(&self) -> OriginSteeringPolicy {
        self.origin_steering
            .as_ref()
            .map(|s| s.policy)
            .unwrap_or_default()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude? as f64, self.longitude? as f64))
    }
}

/// A single backend endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OriginConfig {
    pub name: String,

    /// Hostname or IP address.
    pub address: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub header: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OriginSteeringConfig {
    #[serde(default)]
    pub policy: OriginSteeringPolicy,
}

/// How an origin is picked inside a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginSteeringPolicy {
    /// Weighted random.
    #[default]
    #[serde(alias = "")]
    Random,

    /// Weighted rendezvous hash over the client identity.
    Hash,

    /// First healthy origin in listed order.
    #[serde(alias = "order")]
    Failover,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoadSheddingConfig {
    /// Percent (0-100) of new traffic to shed.
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub default_percent: f32,

    #[serde(default)]
    pub default_policy: SheddingPolicy,

    /// Percent (0-100) of traffic with an existing session to shed.
    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub session_percent: f32,

    #[serde(default)]
    pub session_policy: SheddingPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheddingPolicy {
    #[default]
    #[serde(alias = "")]
    Random,
    Hash,
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}
