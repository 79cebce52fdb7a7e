use crate::conf::types::{LoadBalancerConfig, PoolConfig, RuntimeConfig};
use crate::traffic_management::{HealthFoldPolicy, LoadBalancerId, PoolId};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable routing configuration. Swapped atomically on reload; in-flight
/// decisions keep the snapshot they started with.
#[derive(Debug, Clone, Default)]
pub struct TrafficSnapshot {
    pub pools: HashMap<PoolId, Arc<PoolConfig>>,
    pub load_balancers: HashMap<LoadBalancerId, Arc<LoadBalancerConfig>>,
    pub health_fold: HealthFoldPolicy,
}

impl TrafficSnapshot {
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        let pools = cfg
            .pools
            .iter()
            .map(|p| (PoolId::from(p.key()), Arc::new(p.clone())))
            .collect();

        let load_balancers = cfg
            .load_balancers
            .iter()
            .map(|lb| (LoadBalancerId::from(lb.key()), Arc::new(lb.clone())))
            .collect();

        Self {
            pools,
            load_balancers,
            health_fold: HealthFoldPolicy::from_engine(&cfg.engine),
        }
    }

    pub fn pool(&self, id: &str) -> Option<&Arc<PoolConfig>> {
        self.pools.get(id)
    }

    pub fn load_balancer(&self, id: &str) -> Option<&Arc<LoadBalancerConfig>> {
        self.load_balancers.get(id)
    }

    pub fn has_origin(&self, pool: &str, origin: &str) -> bool {
        self.pool(pool)
            .is_some_and(|p| p.origins.iter().any(|o| o.name == origin))
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pools.insert(PoolId::from(pool.key()), Arc::new(pool));
        self
    }

    pub fn with_load_balancer(mut self, lb: LoadBalancerConfig) -> Self {
        self.load_balancers
            .insert(LoadBalancerId::from(lb.key()), Arc::new(lb));
        self
    }

    pub fn with_health_fold(mut self, fold: HealthFoldPolicy) -> Self {
        self.health_fold = fold;
        self
    }
}
