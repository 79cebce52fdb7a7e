use crate::ctx::RequestCtx;
use crate::traffic_management::PoolId;
use crate::traffic_management::algorithms::OriginStrategy;
use crate::traffic_management::selector::OriginCandidate;
use rand::RngCore;

/// First usable origin in listed order.
#[derive(Debug, Default)]
pub struct Failover;

impl OriginStrategy for Failover {
    fn pick(
        &self,
        _req: &RequestCtx,
        _pool: &PoolId,
        candidates: &[OriginCandidate<'_>],
        _rng: &mut dyn RngCore,
    ) -> Option<usize> {
        (!candidates.is_empty()).then_some(0)
    }
}
