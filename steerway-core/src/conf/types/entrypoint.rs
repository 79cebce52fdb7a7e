use serde::{Deserialize, Serialize};

/// Represents the top-level `steerway.hcl` file.
#[derive(Debug, Deserialize)]
pub struct EntrypointConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub include: IncludeConfig,
}

/// Engine-wide settings that are not part of any API object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// How regional health observations fold into one verdict per origin.
    #[serde(default)]
    pub health_fold: HealthFoldMode,

    /// Region whose observation decides when `health_fold = "region"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_region: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFoldMode {
    #[default]
    Majority,
    Any,
    Region,
}

/// Glob patterns, relative to the config root, of the JSON object files.
#[derive(Debug, Deserialize)]
pub struct IncludeConfig {
    #[serde(default = "default_monitors")]
    pub monitors: String,
    #[serde(default = "default_pools")]
    pub pools: String,
    #[serde(default = "default_load_balancers")]
    pub load_balancers: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            monitors: default_monitors(),
            pools: default_pools(),
            load_balancers: default_load_balancers(),
        }
    }
}

fn default_monitors() -> String {
    "monitors/*.json".to_string()
}

fn default_pools() -> String {
    "pools/*.json".to_string()
}

fn default_load_balancers() -> String {
    "load_balancers/*.json".to_string()
}
