mod discover;
mod loader;
mod parse;
pub mod types;
pub(crate) mod validation;


pub use loader::{load_config, load_runtime_config};
pub use parse::ENTRYPOINT_FILE;
pub use types::RuntimeConfig;
pub use validation::{
    ConfigError, Severity, Subject, ValidatedConfig, ValidationIssue, ValidationReport,
    validate_config,
};
