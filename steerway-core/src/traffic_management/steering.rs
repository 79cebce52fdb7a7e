use crate::conf::types::{PoolConfig, SteeringPolicy};
use crate::ctx::RequestCtx;
use crate::traffic_management::rules::EffectiveConfig;
use crate::traffic_management::{
    Coordinates, LoadBalancerId, PoolId, PoolSelector, TrafficError, TrafficSnapshot,
};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use smallvec::SmallVec;
use std::time::Duration;

/// Ordered pool ids to try for one request.
pub type CandidatePools<'c> = SmallVec<[&'c str; 8]>;

/// Orders the candidate pools of a request per the steering policy.
#[derive(Debug, Clone, Copy)]
pub struct SteeringEngine<'a> {
    snapshot: &'a TrafficSnapshot,
    selector: PoolSelector<'a>,
}

impl<'a> SteeringEngine<'a> {
    pub fn new(snapshot: &'a TrafficSnapshot, selector: PoolSelector<'a>) -> Self {
        Self { snapshot, selector }
    }

    /// An unset policy means `geo` when any geo map has entries, `off` otherwise.
    pub fn resolve_policy(cfg: &EffectiveConfig) -> SteeringPolicy {
        match cfg.steering_policy {
            SteeringPolicy::Unspecified => {
                let has_geo = !cfg.country_pools.is_empty()
                    || !cfg.pop_pools.is_empty()
                    || !cfg.region_pools.is_empty();
                if has_geo {
                    SteeringPolicy::Geo
                } else {
                    SteeringPolicy::Off
                }
            }
            policy => policy,
        }
    }

    pub fn candidate_pools<'c>(
        &self,
        lb: &LoadBalancerId,
        cfg: &'c EffectiveConfig,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Result<CandidatePools<'c>, TrafficError> {
        let pools = match Self::resolve_policy(cfg) {
            SteeringPolicy::Unspecified | SteeringPolicy::Off => {
                cfg.default_pools.iter().map(String::as_str).collect()
            }
            SteeringPolicy::Geo => Self::geo(cfg, req),
            SteeringPolicy::DynamicLatency => self.dynamic_latency(lb, cfg)?,
            SteeringPolicy::Random => Self::random(cfg, rng),
            SteeringPolicy::Proximity => self.proximity(lb, cfg, req)?,
        };

        Ok(pools)
    }

    /// Country map, then PoP map, then region map; the first map with an
    /// entry for the request wins. Default pools follow, without duplicates.
    fn geo<'c>(cfg: &'c EffectiveConfig, req: &RequestCtx) -> CandidatePools<'c> {
        let lookups = [
            (&cfg.country_pools, req.country.as_deref()),
            (&cfg.pop_pools, req.pop.as_deref()),
            (&cfg.region_pools, req.region.as_deref()),
        ];

        let geo_pools = lookups
            .into_iter()
            .find_map(|(map, key)| map.get(key?))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut pools = CandidatePools::new();
        for pool in geo_pools.iter().chain(cfg.default_pools.iter()) {
            if !pools.contains(&pool.as_str()) {
                pools.push(pool.as_str());
            }
        }
        pools
    }

    /// Ascending by best healthy-origin RTT. Stable; pools without RTT last.
    fn dynamic_latency<'c>(
        &self,
        lb: &LoadBalancerId,
        cfg: &'c EffectiveConfig,
    ) -> Result<CandidatePools<'c>, TrafficError> {
        let mut ranked: SmallVec<[(Option<Duration>, &'c str); 8]> = SmallVec::new();
        for pool in &cfg.default_pools {
            let config = self.pool(lb, pool)?;
            ranked.push((self.selector.best_rtt(config), pool.as_str()));
        }

        ranked.sort_by_key(|(rtt, _)| match rtt {
            Some(rtt) => (false, *rtt),
            None => (true, Duration::ZERO),
        });

        Ok(ranked.into_iter().map(|(_, pool)| pool).collect())
    }

    /// Weighted permutation without replacement. Zero-weight pools go last in
    /// listed order; when every weight is zero the order is a uniform shuffle.
    fn random<'c>(cfg: &'c EffectiveConfig, rng: &mut dyn RngCore) -> CandidatePools<'c> {
        let weight_of = |pool: &str| {
            let weight = cfg
                .random_steering
                .as_ref()
                .map_or(1.0, |r| r.weight_of(pool));
            if weight.is_finite() { weight.max(0.0) } else { 0.0 }
        };

        let (mut weighted, mut zero): (Vec<_>, Vec<_>) = cfg
            .default_pools
            .iter()
            .map(|pool| (pool.as_str(), weight_of(pool)))
            .partition(|(_, weight)| *weight > 0.0);

        if weighted.is_empty() {
            zero.shuffle(rng);
            return zero.into_iter().map(|(pool, _)| pool).collect();
        }

        // Relative to the largest weight, so the sum stays finite.
        let max = weighted.iter().map(|(_, w)| *w).fold(0.0, f64::max);
        for (_, weight) in &mut weighted {
            *weight /= max;
        }

        let mut pools = CandidatePools::new();
        while !weighted.is_empty() {
            let total: f64 = weighted.iter().map(|(_, w)| w).sum();
            if !total.is_finite() || total <= 0.0 {
                // Only weights that underflowed to zero are left.
                break;
            }
            let mut point = rng.random_range(0.0..total);

            let mut chosen = weighted.len() - 1;
            for (i, (_, weight)) in weighted.iter().enumerate() {
                if point < *weight {
                    chosen = i;
                    break;
                }
                point -= weight;
            }

            pools.push(weighted.remove(chosen).0);
        }

        pools.extend(weighted.into_iter().map(|(pool, _)| pool));
        pools.extend(zero.into_iter().map(|(pool, _)| pool));
        pools
    }

    /// Ascending great-circle distance from the client. Pools without
    /// coordinates go last; without client coordinates the listed order stays.
    fn proximity<'c>(
        &self,
        lb: &LoadBalancerId,
        cfg: &'c EffectiveConfig,
        req: &RequestCtx,
    ) -> Result<CandidatePools<'c>, TrafficError> {
        let mut ranked: SmallVec<[(Option<f64>, &'c str); 8]> = SmallVec::new();
        for pool in &cfg.default_pools {
            let config = self.pool(lb, pool)?;
            let distance = match (req.coordinates, config.coordinates()) {
                (Some(client), Some(site)) => Some(client.distance_km(&Coordinates::from(site))),
                _ => None,
            };
            ranked.push((distance, pool.as_str()));
        }

        if req.coordinates.is_some() {
            ranked.sort_by(|(a, _), (b, _)| match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }

        Ok(ranked.into_iter().map(|(_, pool)| pool).collect())
    }

    fn pool(
        &self,
        lb: &LoadBalancerId,
        pool: &str,
    ) -> Result<&'a PoolConfig, TrafficError> {
        self.snapshot
            .pool(pool)
            .map(|p| p.as_ref())
            .ok_or_else(|| TrafficError::UnknownPool {
                load_balancer: lb.clone(),
                pool: PoolId::from(pool),
            })
    }
}
