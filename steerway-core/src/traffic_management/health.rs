use crate::conf::types::{EngineConfig, HealthFoldMode, OriginConfig, PoolConfig};
use crate::traffic_management::{OriginId, PoolId, RegionCode};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Latest probe result for one origin, as seen from one region.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthObservation {
    pub healthy: bool,
    pub rtt: Option<Duration>,
    pub failure_reason: Option<String>,
    pub response_code: Option<u16>,
    pub observed_at: DateTime<Utc>,
}

impl HealthObservation {
    pub fn healthy(rtt: Duration) -> Self {
        Self {
            healthy: true,
            rtt: Some(rtt),
            failure_reason: None,
            response_code: None,
            observed_at: Utc::now(),
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            healthy: false,
            rtt: None,
            failure_reason: Some(reason.into()),
            response_code: None,
            observed_at: Utc::now(),
        }
    }

    pub fn with_response_code(mut self, code: u16) -> Self {
        self.response_code = Some(code);
        self
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}

/// How regional observations fold into one verdict per origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HealthFoldPolicy {
    /// Strictly more than half of the reporting regions are healthy.
    #[default]
    Majority,

    /// At least one reporting region is healthy.
    AnyHealthy,

    /// The given region alone decides.
    RequireRegion(RegionCode),
}

impl HealthFoldPolicy {
    pub fn from_engine(engine: &EngineConfig) -> Self {
        match (engine.health_fold, &engine.required_region) {
            (HealthFoldMode::Majority, _) => Self::Majority,
            (HealthFoldMode::Any, _) => Self::AnyHealthy,
            (HealthFoldMode::Region, Some(region)) => {
                Self::RequireRegion(RegionCode(region.clone()))
            }
            // Rejected by validation; fall back to the safest fold.
            (HealthFoldMode::Region, None) => Self::Majority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy { rtt: Option<Duration> },
    Unhealthy,
    /// No usable observation. Treated as unhealthy.
    Unknown,
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy { .. })
    }

    pub fn rtt(&self) -> Option<Duration> {
        match self {
            HealthVerdict::Healthy { rtt } => *rtt,
            _ => None,
        }
    }
}

pub type RegionalHealth = BTreeMap<RegionCode, HealthObservation>;

/// Latest health observation per (pool, origin, region).
///
/// Writers upsert under the shard lock of their (pool, origin) entry, so a
/// verdict always folds one consistent set of regional observations.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    fold: ArcSwap<HealthFoldPolicy>,
    origins: DashMap<(PoolId, OriginId), RegionalHealth>,
}

impl HealthRegistry {
    pub fn new(fold: HealthFoldPolicy) -> Self {
        Self {
            fold: ArcSwap::from_pointee(fold),
            origins: DashMap::new(),
        }
    }

    pub fn fold_policy(&self) -> Arc<HealthFoldPolicy> {
        self.fold.load_full()
    }

    pub fn set_fold_policy(&self, fold: HealthFoldPolicy) {
        self.fold.store(Arc::new(fold));
    }

    pub fn observe(
        &self,
        pool: PoolId,
        origin: OriginId,
        region: RegionCode,
        observation: HealthObservation,
    ) {
        self.origins
            .entry((pool, origin))
            .or_default()
            .insert(region, observation);
    }

    /// Fold every region's observation of the origin.
    pub fn verdict(&self, pool: &PoolId, origin: &OriginId) -> HealthVerdict {
        self.fold_regions(pool, origin, &[])
    }

    /// Verdict for a configured origin. Only the pool's `check_regions` count,
    /// and origins of unmonitored pools are always healthy.
    pub fn verdict_for(&self, pool: &PoolConfig, origin: &OriginConfig) -> HealthVerdict {
        if pool.monitor.is_none() {
            return HealthVerdict::Healthy { rtt: None };
        }

        self.fold_regions(
            &PoolId::from(pool.key()),
            &OriginId::from(origin.name.as_str()),
            &pool.check_regions,
        )
    }

    /// Copy of the regional observations of one origin.
    pub fn observations(&self, pool: &PoolId, origin: &OriginId) -> RegionalHealth {
        self.origins
            .get(&(pool.clone(), origin.clone()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Drop observations rejected by `keep`, e.g. for pools removed by a reload.
    pub fn retain_pools(&self, keep: impl Fn(&PoolId, &OriginId) -> bool) {
        self.origins.retain(|(pool, origin), _| keep(pool, origin));
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    fn fold_regions(&self, pool: &PoolId, origin: &OriginId, regions: &[String]) -> HealthVerdict {
        let fold = self.fold.load();

        let Some(entry) = self.origins.get(&(pool.clone(), origin.clone())) else {
            return HealthVerdict::Unknown;
        };
        let observations = entry.value();

        let considered = |region: &RegionCode| {
            regions.is_empty() || regions.iter().any(|r| r.as_str() == region.as_str())
        };

        let passes: fn(usize, usize) -> bool = match fold.as_ref() {
            HealthFoldPolicy::Majority => |healthy, total| healthy * 2 > total,
            HealthFoldPolicy::AnyHealthy => |healthy, _| healthy > 0,
            HealthFoldPolicy::RequireRegion(required) => {
                return match observations.get(required) {
                    Some(_) if !considered(required) => HealthVerdict::Unknown,
                    Some(obs) if obs.healthy => HealthVerdict::Healthy { rtt: obs.rtt },
                    Some(_) => HealthVerdict::Unhealthy,
                    None => HealthVerdict::Unknown,
                };
            }
        };

        let mut total = 0usize;
        let mut healthy = 0usize;
        let mut best_rtt: Option<Duration> = None;

        for obs in observations
            .iter()
            .filter(|(region, _)| considered(region))
            .map(|(_, obs)| obs)
        {
            total += 1;
            if obs.healthy {
                healthy += 1;
                if let Some(rtt) = obs.rtt {
                    best_rtt = Some(best_rtt.map_or(rtt, |best| best.min(rtt)));
                }
            }
        }

        if total == 0 {
            HealthVerdict::Unknown
        } else if passes(healthy, total) {
            HealthVerdict::Healthy { rtt: best_rtt }
        } else {
            HealthVerdict::Unhealthy
        }
    }
}
