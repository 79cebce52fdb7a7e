use crate::conf::validation::ConfigError;
use glob::glob;
use std::path::{Path, PathBuf};

/// Discovers the files matching `glob_pattern` below `root`.
///
/// Paths are returned sorted so that object order, and with it duplicate-id
/// reporting, does not depend on directory iteration order. Unreadable
/// entries are skipped.
pub fn discover(root: &Path, glob_pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let pattern = &resolve_glob(root, glob_pattern);
    let mut paths: Vec<_> = glob(pattern)
        .map_err(|e| ConfigError::Glob {
            pattern: pattern.to_string(),
            source: e,
        })?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();

    paths.sort();
    Ok(paths)
}

/// Joins a relative glob pattern onto the config root.
pub fn resolve_glob(root: &Path, pattern: &str) -> String {
    root.join(pattern).to_string_lossy().into_owned()
}
