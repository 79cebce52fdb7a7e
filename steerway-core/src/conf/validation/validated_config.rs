use crate::conf::types::RuntimeConfig;
use crate::conf::validation::report::ValidationReport;

/// A configuration that passed validation. `report` holds the warnings.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub config: RuntimeConfig,
    pub report: ValidationReport,
}
