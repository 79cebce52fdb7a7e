use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;

/// The configuration object an issue is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub kind: &'static str,
    pub key: String,
    pub field: Option<String>,
}

impl Subject {
    pub fn monitor(key: &str) -> Self {
        Self::new("monitor", key)
    }

    pub fn pool(key: &str) -> Self {
        Self::new("pool", key)
    }

    pub fn load_balancer(key: &str) -> Self {
        Self::new("load_balancer", key)
    }

    pub fn engine() -> Self {
        Self::new("engine", "")
    }

    fn new(kind: &'static str, key: &str) -> Self {
        Self {
            kind,
            key: key.to_owned(),
            field: None,
        }
    }

    pub fn field(&self, field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..self.clone()
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.kind)?;
        } else {
            write!(f, "{} '{}'", self.kind, self.key)?;
        }
        match &self.field {
            Some(field) => write!(f, " {}", field),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    pub subject: Subject,
    pub help: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidationReportJson<'a> {
    errors: &'a [ValidationIssue],
    warnings: &'a [ValidationIssue],
}

impl ValidationReport {
    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, message: String, subject: &Subject, help: Option<String>) {
        self.errors.push(ValidationIssue {
            severity: Severity::Error,
            message,
            subject: subject.clone(),
            help,
        });
    }

    fn warning(&mut self, message: String, subject: &Subject, help: Option<String>) {
        self.warnings.push(ValidationIssue {
            severity: Severity::Warning,
            message,
            subject: subject.clone(),
            help,
        });
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ValidationReportJson {
            errors: &self.errors,
            warnings: &self.warnings,
        })
    }

    pub fn render_plain(&self) {
        for issue in self.errors.iter().chain(self.warnings.iter()) {
            let severity = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            println!("{}: {}: {}", issue.subject, severity, issue.message);

            if let Some(help) = &issue.help {
                println!("  help: {}", help);
            }
        }
    }

    pub fn render_pretty(&self) {
        if self.has_violations() {
            println!(
                "configuration validation found {} errors, {} warnings\n",
                self.errors.len(),
                self.warnings.len()
            );
        }

        for issue in self.errors.iter().chain(self.warnings.iter()) {
            match issue.severity {
                Severity::Error => {
                    println!("{}: {}", "error".red().bold(), issue.subject);
                }
                Severity::Warning => {
                    println!("{}: {}", "warning".yellow().bold(), issue.subject);
                }
            }
            println!("  {}", issue.message);

            if let Some(help) = &issue.help {
                println!("  {}: {}", "help".cyan(), help);
            }
            println!();
        }
    }
}

/// Identity
impl ValidationReport {
    pub fn missing_id(&mut self, subject: &Subject) {
        self.error("object has neither an id nor a name".to_string(), subject, None);
    }

    pub fn duplicate_id(&mut self, subject: &Subject) {
        self.error(
            format!("duplicate {} id '{}'", subject.kind, subject.key),
            subject,
            None,
        );
    }
}

/// Engine Validation
impl ValidationReport {
    pub fn missing_required_region(&mut self, subject: &Subject) {
        self.error(
            "health_fold = \"region\" requires required_region".to_string(),
            subject,
            Some("Set engine.required_region, e.g. required_region = \"WEU\".".to_string()),
        );
    }
}

/// Pool Validation
impl ValidationReport {
    pub fn unknown_monitor(&mut self, monitor: &str, subject: &Subject) {
        self.error(format!("unknown monitor '{}'", monitor), subject, None);
    }

    pub fn invalid_origin_weight(&mut self, weight: f64, subject: &Subject) {
        self.error(
            format!("origin weight must be a non-negative number, got {}", weight),
            subject,
            None,
        );
    }

    pub fn duplicate_origin(&mut self, name: &str, subject: &Subject) {
        self.error(format!("duplicate origin name '{}'", name), subject, None);
    }

    pub fn invalid_coordinate(&mut self, value: f32, range: f32, subject: &Subject) {
        self.error(
            format!("coordinate {} is outside -{range}..={range}", value),
            subject,
            None,
        );
    }

    pub fn partial_coordinates(&mut self, subject: &Subject) {
        self.error(
            "latitude and longitude must be set together".to_string(),
            subject,
            None,
        );
    }

    pub fn invalid_shedding_percent(&mut self, percent: f32, subject: &Subject) {
        self.error(
            format!("shedding percent must be within 0..=100, got {}", percent),
            subject,
            None,
        );
    }

    pub fn no_enabled_origins(&mut self, subject: &Subject) {
        self.warning(
            "pool has no enabled origins and will never be selected".to_string(),
            subject,
            None,
        );
    }

    pub fn unreachable_minimum_origins(&mut self, minimum: u32, enabled: usize, subject: &Subject) {
        self.warning(
            format!(
                "minimum_origins is {} but only {} origins are enabled",
                minimum, enabled
            ),
            subject,
            Some("The pool can only serve traffic as a fallback pool.".to_string()),
        );
    }
}

/// Load Balancer Validation
impl ValidationReport {
    pub fn unknown_pool(&mut self, pool: &str, subject: &Subject) {
        self.error(format!("unknown pool '{}'", pool), subject, None);
    }

    pub fn empty_default_pools(&mut self, subject: &Subject) {
        self.error("default_pools must not be empty".to_string(), subject, None);
    }

    pub fn invalid_pool_weight(&mut self, pool: &str, weight: f64, subject: &Subject) {
        self.error(
            format!(
                "random steering weight for pool '{}' must be a non-negative number, got {}",
                pool, weight
            ),
            subject,
            None,
        );
    }

    pub fn invalid_status_code(&mut self, status: u16, subject: &Subject) {
        self.error(format!("invalid HTTP status code {}", status), subject, None);
    }

    pub fn pool_without_coordinates(&mut self, pool: &str, subject: &Subject) {
        self.warning(
            format!("pool '{}' has no coordinates and sorts last", pool),
            subject,
            Some("Set latitude and longitude on the pool for proximity steering.".to_string()),
        );
    }

    pub fn unreachable_rule(&mut self, rule: &str, subject: &Subject) {
        self.warning(
            format!(
                "rule '{}' follows an unconditional terminating rule and never runs",
                rule
            ),
            subject,
            None,
        );
    }
}
