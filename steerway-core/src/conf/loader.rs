use crate::conf::discover::discover;
use crate::conf::parse::{parse_entrypoint, parse_objects};
use crate::conf::types::RuntimeConfig;
use crate::conf::validation::{ConfigError, ValidatedConfig, validate_config};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

pub fn load_config(root: &Path) -> Result<ValidatedConfig, ConfigError> {
    let config = load_runtime_config(root)?;

    //--------------------------------------------------------------------------
    // Semantic validation (aggregate all errors and warnings)
    //--------------------------------------------------------------------------
    let report = validate_config(&config);
    if report.has_errors() {
        return Err(ConfigError::Validation { report });
    }

    for issue in &report.warnings {
        warn!(
            event = "config_warning",
            subject = %issue.subject,
            message = %issue.message
        );
    }

    Ok(ValidatedConfig { config, report })
}

/// Parse the entrypoint and every included object file without validating.
pub fn load_runtime_config(root: &Path) -> Result<RuntimeConfig, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let entry = parse_entrypoint(root)?;

    let monitors = load_objects(root, &entry.include.monitors)?;
    let pools = load_objects(root, &entry.include.pools)?;
    let load_balancers = load_objects(root, &entry.include.load_balancers)?;

    debug!(
        event = "config_parsed",
        root = %root.display(),
        monitors = monitors.len(),
        pools = pools.len(),
        load_balancers = load_balancers.len()
    );

    Ok(RuntimeConfig {
        engine: entry.engine,
        monitors,
        pools,
        load_balancers,
    })
}

fn load_objects<T: DeserializeOwned>(root: &Path, pattern: &str) -> Result<Vec<T>, ConfigError> {
    let mut objects = Vec::new();
    for path in discover(root, pattern)? {
        objects.extend(parse_objects(&path)?);
    }
    Ok(objects)
}
