use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use steerway_core::conf::{ValidatedConfig, load_config};
use steerway_core::traffic_management::TrafficManager;
use tempfile::TempDir;

/// A configuration directory on disk, removed when dropped.
pub struct ConfigDir {
    dir: TempDir,
}

impl ConfigDir {
    /// Entrypoint using the default include globs.
    pub fn new() -> Self {
        Self::with_entrypoint("")
    }

    pub fn with_entrypoint(hcl: &str) -> Self {
        let cfg = Self {
            dir: tempfile::tempdir().expect("failed to create config dir"),
        };
        cfg.write("steerway.hcl", hcl);
        cfg
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create config subdir");
        }
        fs::write(&path, contents).expect("failed to write config file");
        self
    }

    pub fn write_json(&self, rel: &str, value: Value) -> &Self {
        let contents = serde_json::to_string_pretty(&value).expect("invalid json fixture");
        self.write(rel, &contents)
    }

    pub fn monitor(&self, id: &str) -> &Self {
        self.write_json(
            &format!("monitors/{id}.json"),
            json!({ "id": id, "type": "http", "expected_codes": "2xx" }),
        )
    }

    pub fn pool(&self, value: Value) -> &Self {
        let rel = format!("pools/{}.json", object_name(&value));
        self.write_json(&rel, value)
    }

    pub fn load_balancer(&self, value: Value) -> &Self {
        let rel = format!("load_balancers/{}.json", object_name(&value));
        self.write_json(&rel, value)
    }

    pub fn load(&self) -> ValidatedConfig {
        load_config(self.path()).expect("fixture config failed to load")
    }

    pub fn manager(&self) -> TrafficManager {
        TrafficManager::from_config(&self.load().config)
    }
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

fn object_name(value: &Value) -> String {
    value["name"]
        .as_str()
        .expect("fixture object needs a name")
        .to_string()
}
