use crate::conf::types::RuntimeConfig;
use crate::ctx::RequestCtx;
use crate::traffic_management::admin::PoolHealthView;
use crate::traffic_management::{
    Decision, HealthObservation, HealthRegistry, LoadBalancerId, OriginId, PoolId, RegionCode,
    SessionAffinityManager, TrafficDirector, TrafficError, TrafficSnapshot,
};
use arc_swap::ArcSwap;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Owns the live configuration snapshot, the shared health registry and the
/// session pins.
#[derive(Debug)]
pub struct TrafficManager {
    snapshot: ArcSwap<TrafficSnapshot>,

    /// Shared with the health feed task.
    health: Arc<HealthRegistry>,

    sessions: SessionAffinityManager,
}

impl TrafficManager {
    pub fn new(initial: TrafficSnapshot) -> Self {
        let tm = Self {
            snapshot: ArcSwap::from_pointee(TrafficSnapshot::default()),
            health: Arc::new(HealthRegistry::new(initial.health_fold.clone())),
            sessions: SessionAffinityManager::new(),
        };

        tm.update(initial);

        tm
    }

    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self::new(TrafficSnapshot::from_config(cfg))
    }

    pub fn health(&self) -> &Arc<HealthRegistry> {
        &self.health
    }

    pub fn sessions(&self) -> &SessionAffinityManager {
        &self.sessions
    }
}

/// Snapshot API
impl TrafficManager {
    pub fn snapshot(&self) -> Arc<TrafficSnapshot> {
        self.snapshot.load_full()
    }

    /// Swap in a new configuration and drop state for removed objects.
    pub fn update(&self, new_snapshot: TrafficSnapshot) {
        // Cleanup health observations of removed pools and origins
        self.health
            .retain_pools(|pool, origin| new_snapshot.has_origin(pool.as_str(), origin.as_str()));

        // Cleanup session pins of removed load balancers, pools and origins
        self.sessions.retain(|pin| {
            new_snapshot
                .load_balancer(pin.load_balancer.as_str())
                .is_some()
                && new_snapshot.has_origin(pin.pool.as_str(), pin.origin.as_str())
        });
        self.sessions.purge_expired(Instant::now());

        self.health.set_fold_policy(new_snapshot.health_fold.clone());

        info!(
            event = "config_swapped",
            pools = new_snapshot.pools.len(),
            load_balancers = new_snapshot.load_balancers.len(),
            fold = ?new_snapshot.health_fold,
        );

        self.snapshot.store(Arc::new(new_snapshot));
    }
}

/// Health API
impl TrafficManager {
    pub fn report_health(
        &self,
        pool: PoolId,
        origin: OriginId,
        region: RegionCode,
        observation: HealthObservation,
    ) {
        self.health.observe(pool, origin, region, observation);
    }

    pub fn pool_health(&self, pool: &str) -> Option<PoolHealthView> {
        let snapshot = self.snapshot();
        let pool = snapshot.pool(pool)?;
        Some(PoolHealthView::build(&self.health, pool))
    }

    /// Take an origin out of rotation for existing sessions.
    pub fn drain_origin(&self, pool: &PoolId, origin: &OriginId) -> usize {
        self.sessions.drain(pool, origin)
    }
}

/// Routing API
impl TrafficManager {
    pub fn route(
        &self,
        lb: &LoadBalancerId,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Result<Decision, TrafficError> {
        self.route_at(lb, req, rng, Instant::now())
    }

    /// Route against the snapshot current at call time. A concurrent
    /// `update` does not affect a decision already in progress.
    pub fn route_at(
        &self,
        lb: &LoadBalancerId,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
        now: Instant,
    ) -> Result<Decision, TrafficError> {
        let snapshot = self.snapshot();
        TrafficDirector.decide(req, &snapshot, lb, self, rng, now)
    }
}
