use crate::conf::types::PoolConfig;
use crate::traffic_management::{HealthRegistry, OriginId, PoolId, PoolSelector, RegionCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Health report of one pool, shaped like the pool health API response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolHealthView {
    pub pool_id: PoolId,

    /// Whether steering may choose the pool right now.
    pub eligible: bool,

    /// Folded verdict per configured origin.
    pub origins: Vec<OriginVerdictView>,

    /// Raw observations per probing region.
    pub pop_health: BTreeMap<RegionCode, RegionHealthView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginVerdictView {
    pub name: String,
    pub address: String,
    pub enabled: bool,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionHealthView {
    /// At least `minimum_origins` enabled origins are healthy from this region.
    pub healthy: bool,

    /// One single-entry map per origin, keyed by origin address.
    pub origins: Vec<BTreeMap<String, OriginHealthView>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginHealthView {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
}

fn format_rtt(rtt: Duration) -> String {
    format!("{:.1}ms", rtt.as_secs_f64() * 1000.0)
}

impl PoolHealthView {
    pub fn build(registry: &HealthRegistry, pool: &PoolConfig) -> Self {
        let pool_id = PoolId::from(pool.key());
        let selector = PoolSelector::new(registry);

        let origins = pool
            .origins
            .iter()
            .map(|origin| {
                let verdict = registry.verdict_for(pool, origin);
                OriginVerdictView {
                    name: origin.name.clone(),
                    address: origin.address.clone(),
                    enabled: origin.enabled,
                    healthy: verdict.is_healthy(),
                    rtt: verdict.rtt().map(format_rtt),
                }
            })
            .collect();

        let mut pop_health: BTreeMap<RegionCode, RegionHealthView> = BTreeMap::new();
        let mut healthy_per_region: BTreeMap<RegionCode, usize> = BTreeMap::new();

        for origin in &pool.origins {
            let origin_id = OriginId::from(origin.name.as_str());
            let observations = registry.observations(&pool_id, &origin_id);

            for (region, obs) in observations {
                if !pool.check_regions.is_empty()
                    && !pool.check_regions.iter().any(|r| r.as_str() == region.as_str())
                {
                    continue;
                }

                if origin.enabled && obs.healthy {
                    *healthy_per_region.entry(region.clone()).or_default() += 1;
                }

                let view = OriginHealthView {
                    healthy: obs.healthy,
                    rtt: obs.rtt.map(format_rtt),
                    failure_reason: obs.failure_reason,
                    response_code: obs.response_code,
                };

                pop_health
                    .entry(region)
                    .or_insert_with(|| RegionHealthView {
                        healthy: false,
                        origins: Vec::new(),
                    })
                    .origins
                    .push(BTreeMap::from([(origin.address.clone(), view)]));
            }
        }

        for (region, view) in pop_health.iter_mut() {
            let healthy = healthy_per_region.get(region).copied().unwrap_or(0);
            view.healthy = healthy >= pool.effective_minimum_origins();
        }

        Self {
            pool_id,
            eligible: selector.eligible(pool),
            origins,
            pop_health,
        }
    }
}
