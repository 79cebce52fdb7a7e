use crate::traffic_management::{HealthObservation, HealthReport};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One line of a health file: a probe result from one region.
#[derive(Debug, Deserialize)]
struct HealthRecord {
    pool: String,
    origin: String,
    region: String,
    healthy: bool,
    #[serde(default)]
    rtt_ms: Option<f64>,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    response_code: Option<u16>,
    #[serde(default)]
    observed_at: Option<DateTime<Utc>>,
}

impl From<HealthRecord> for HealthReport {
    fn from(r: HealthRecord) -> Self {
        HealthReport {
            pool: r.pool.into(),
            origin: r.origin.into(),
            region: r.region.into(),
            observation: HealthObservation {
                healthy: r.healthy,
                rtt: r
                    .rtt_ms
                    .filter(|ms| ms.is_finite() && *ms >= 0.0)
                    .map(|ms| Duration::from_secs_f64(ms / 1000.0)),
                failure_reason: r.failure_reason,
                response_code: r.response_code,
                observed_at: r.observed_at.unwrap_or_else(Utc::now),
            },
        }
    }
}

/// Read a JSON array of health records.
pub fn read_health_file(path: &Path) -> anyhow::Result<Vec<HealthReport>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read health file {}", path.display()))?;

    let records: Vec<HealthRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse health file {}", path.display()))?;

    Ok(records.into_iter().map(HealthReport::from).collect())
}
