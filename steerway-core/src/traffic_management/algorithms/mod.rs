mod failover;
mod random;
mod sticky_hash;

pub use failover::*;
pub use random::*;
pub use sticky_hash::*;

use crate::conf::types::OriginSteeringPolicy;
use crate::ctx::RequestCtx;
use crate::traffic_management::PoolId;
use crate::traffic_management::selector::OriginCandidate;
use rand::RngCore;

/// Picks one origin out of the usable origins of a pool.
pub trait OriginStrategy: Send + Sync {
    /// Index into `candidates`, or `None` when nothing can be picked.
    fn pick(
        &self,
        req: &RequestCtx,
        pool: &PoolId,
        candidates: &[OriginCandidate<'_>],
        rng: &mut dyn RngCore,
    ) -> Option<usize>;
}

static FAILOVER: Failover = Failover;
static HASH: StickyHash = StickyHash;
static RANDOM: WeightedRandom = WeightedRandom;

pub fn strategy_for(policy: OriginSteeringPolicy) -> &'static dyn OriginStrategy {
    match policy {
        OriginSteeringPolicy::Failover => &FAILOVER,
        OriginSteeringPolicy::Hash => &HASH,
        OriginSteeringPolicy::Random => &RANDOM,
    }
}
