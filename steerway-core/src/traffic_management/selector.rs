use crate::conf::types::{OriginConfig, PoolConfig};
use crate::ctx::RequestCtx;
use crate::traffic_management::algorithms::strategy_for;
use crate::traffic_management::{HealthRegistry, PoolId};
use rand::RngCore;
use std::time::Duration;

/// An enabled and healthy origin of a pool.
#[derive(Debug, Clone, Copy)]
pub struct OriginCandidate<'a> {
    pub origin: &'a OriginConfig,
    pub rtt: Option<Duration>,
}

impl OriginCandidate<'_> {
    pub fn weight(&self) -> f64 {
        if self.origin.weight.is_finite() {
            self.origin.weight.max(0.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pool has no selectable origin")]
pub struct NotEligible;

/// Pool eligibility and origin selection inside one pool.
///
/// Read-only over the registry. Safe to use from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct PoolSelector<'a> {
    health: &'a HealthRegistry,
}

impl<'a> PoolSelector<'a> {
    pub fn new(health: &'a HealthRegistry) -> Self {
        Self { health }
    }

    /// Enabled origins with a healthy verdict, in listed order.
    pub fn usable_origins<'p>(&self, pool: &'p PoolConfig) -> Vec<OriginCandidate<'p>> {
        pool.origins
            .iter()
            .filter(|origin| origin.enabled)
            .filter_map(|origin| {
                let verdict = self.health.verdict_for(pool, origin);
                verdict.is_healthy().then(|| OriginCandidate {
                    origin,
                    rtt: verdict.rtt(),
                })
            })
            .collect()
    }

    /// Whether the named origin is enabled and healthy.
    pub fn origin_usable(&self, pool: &PoolConfig, origin: &str) -> bool {
        pool.origins
            .iter()
            .find(|o| o.name == origin)
            .is_some_and(|o| o.enabled && self.health.verdict_for(pool, o).is_healthy())
    }

    pub fn eligible(&self, pool: &PoolConfig) -> bool {
        pool.enabled && self.usable_origins(pool).len() >= pool.effective_minimum_origins()
    }

    /// Lowest RTT among the usable origins.
    pub fn best_rtt(&self, pool: &PoolConfig) -> Option<Duration> {
        self.usable_origins(pool)
            .iter()
            .filter_map(|c| c.rtt)
            .min()
    }

    /// Pick an origin of an eligible pool per its `origin_steering` policy.
    pub fn select<'p>(
        &self,
        pool: &'p PoolConfig,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Result<OriginCandidate<'p>, NotEligible> {
        if !pool.enabled {
            return Err(NotEligible);
        }

        let candidates = self.usable_origins(pool);
        if candidates.len() < pool.effective_minimum_origins() {
            return Err(NotEligible);
        }

        Self::pick(pool, &candidates, req, rng)
    }

    /// Like [`select`](Self::select), ignoring `enabled` and `minimum_origins`
    /// on the pool. Used for the fallback pool.
    pub fn select_any<'p>(
        &self,
        pool: &'p PoolConfig,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Result<OriginCandidate<'p>, NotEligible> {
        let candidates = self.usable_origins(pool);
        Self::pick(pool, &candidates, req, rng)
    }

    fn pick<'p>(
        pool: &'p PoolConfig,
        candidates: &[OriginCandidate<'p>],
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Result<OriginCandidate<'p>, NotEligible> {
        let strategy = strategy_for(pool.origin_steering_policy());
        let pool_id = PoolId::from(pool.key());

        strategy
            .pick(req, &pool_id, candidates, rng)
            .and_then(|i| candidates.get(i).copied())
            .ok_or(NotEligible)
    }
}
