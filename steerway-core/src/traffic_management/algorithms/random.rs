use crate::ctx::RequestCtx;
use crate::traffic_management::PoolId;
use crate::traffic_management::algorithms::OriginStrategy;
use crate::traffic_management::selector::OriginCandidate;
use rand::{Rng, RngCore};

/// Weighted random over the usable origins.
///
/// Zero-weight origins are never picked unless every weight is zero, in which
/// case the pick is uniform.
#[derive(Debug, Default)]
pub struct WeightedRandom;

impl OriginStrategy for WeightedRandom {
    fn pick(
        &self,
        _req: &RequestCtx,
        _pool: &PoolId,
        candidates: &[OriginCandidate<'_>],
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }

        let total: f64 = candidates.iter().map(OriginCandidate::weight).sum();
        if !total.is_finite() || total <= 0.0 {
            return Some(rng.random_range(0..candidates.len()));
        }

        let mut point = rng.random_range(0.0..total);
        for (i, candidate) in candidates.iter().enumerate() {
            let weight = candidate.weight();
            if point < weight {
                return Some(i);
            }
            point -= weight;
        }

        // Float rounding can leave `point` just past the last bucket.
        candidates.iter().rposition(|c| c.weight() > 0.0)
    }
}
