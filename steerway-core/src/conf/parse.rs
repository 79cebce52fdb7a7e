use crate::conf::types::EntrypointConfig;
use crate::conf::validation::ConfigError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const ENTRYPOINT_FILE: &str = "steerway.hcl";

/// An object file holds either one API object or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

pub fn parse_entrypoint(root: &Path) -> Result<EntrypointConfig, ConfigError> {
    let path = root.join(ENTRYPOINT_FILE);
    let s = fs::read_to_string(&path).map_err(|e| ConfigError::read_file(&path, e))?;
    hcl::from_str(&s).map_err(|e| ConfigError::parse(&path, e))
}

pub fn parse_objects<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let parsed: OneOrMany<T> =
        serde_json::from_str(&s).map_err(|e| ConfigError::parse_object(path, e))?;

    Ok(match parsed {
        OneOrMany::One(object) => vec![object],
        OneOrMany::Many(objects) => objects,
    })
}
