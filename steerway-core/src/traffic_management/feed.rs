use crate::traffic_management::{HealthObservation, HealthRegistry, OriginId, PoolId, RegionCode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};

/// One observation on its way to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub pool: PoolId,
    pub origin: OriginId,
    pub region: RegionCode,
    pub observation: HealthObservation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HealthFeedError {
    #[error("health feed is closed")]
    Closed,

    #[error("health feed is full")]
    Full,
}

/// Sending half handed to probers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HealthFeed {
    tx: mpsc::Sender<HealthReport>,
}

/// Bounded feed. Drive the receiver with [`run_health_feed`].
pub fn health_feed(capacity: usize) -> (HealthFeed, mpsc::Receiver<HealthReport>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (HealthFeed { tx }, rx)
}

impl HealthFeed {
    /// Waits for capacity.
    pub async fn report(&self, report: HealthReport) -> Result<(), HealthFeedError> {
        self.tx
            .send(report)
            .await
            .map_err(|_| HealthFeedError::Closed)
    }

    /// Never waits; a full feed rejects the report.
    pub fn try_report(&self, report: HealthReport) -> Result<(), HealthFeedError> {
        self.tx.try_send(report).map_err(|e| match e {
            TrySendError::Full(_) => HealthFeedError::Full,
            TrySendError::Closed(_) => HealthFeedError::Closed,
        })
    }
}

/// Drain the feed into the registry until every sender is dropped.
/// Returns the number of observations applied.
pub async fn run_health_feed(
    mut rx: mpsc::Receiver<HealthReport>,
    registry: Arc<HealthRegistry>,
) -> u64 {
    let mut applied = 0u64;

    while let Some(report) = rx.recv().await {
        debug!(
            event = "health_observed",
            pool = %report.pool,
            origin = %report.origin,
            region = %report.region,
            healthy = report.observation.healthy,
        );

        registry.observe(report.pool, report.origin, report.region, report.observation);
        applied += 1;
    }

    info!(event = "health_feed_closed", observations = applied);
    applied
}
