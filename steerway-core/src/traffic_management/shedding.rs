use crate::conf::types::{PoolConfig, SheddingPolicy};
use crate::ctx::RequestCtx;
use crate::traffic_management::algorithms::stable_hash;
use rand::{Rng, RngCore};
use serde::Serialize;

/// Which share of a pool's traffic a shedding decision applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShedScope {
    /// Requests without a session pin.
    NewTraffic,
    /// Requests served by an existing session pin.
    Session,
}

/// Decide whether a request leaves a pool before origin selection.
///
/// Under the `hash` policy the outcome is stable per (client identity, pool).
pub fn should_shed(
    pool: &PoolConfig,
    scope: ShedScope,
    req: &RequestCtx,
    rng: &mut dyn RngCore,
) -> bool {
    let Some(shedding) = &pool.load_shedding else {
        return false;
    };

    let (percent, policy) = match scope {
        ShedScope::NewTraffic => (shedding.default_percent, shedding.default_policy),
        ShedScope::Session => (shedding.session_percent, shedding.session_policy),
    };

    let percent = f64::from(percent);
    if percent <= 0.0 || percent.is_nan() {
        return false;
    }
    if percent >= 100.0 {
        return true;
    }

    // Position of this request in 0..100.
    let position = match policy {
        SheddingPolicy::Random => rng.random::<f64>() * 100.0,
        SheddingPolicy::Hash => {
            let hash = stable_hash(&(req.client_key().as_str(), pool.key()));
            (hash % 10_000) as f64 / 100.0
        }
    };

    position < percent
}
