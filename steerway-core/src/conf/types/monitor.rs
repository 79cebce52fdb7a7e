use crate::conf::types::null_as_default;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health probe parameters.
///
/// Probing runs outside the engine. Monitors are kept so pools can reference
/// them and so the configuration round-trips with the API representation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,

    #[serde(default = "default_type", rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub header: BTreeMap<String, Vec<String>>,

    /// Seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u32,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds.
    #[serde(default = "default_interval")]
    pub interval: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    pub expected_body: String,

    #[serde(default)]
    pub expected_codes: String,

    #[serde(default)]
    pub follow_redirects: bool,

    #[serde(default)]
    pub allow_insecure: bool,

    #[serde(default)]
    pub probe_zone: String,
}

fn default_type() -> String {
    "http".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

fn default_timeout() -> u32 {
    5
}

fn default_retries() -> u32 {
    2
}

fn default_interval() -> u32 {
    60
}
