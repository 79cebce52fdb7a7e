use crate::ctx::RequestCtx;
use crate::traffic_management::PoolId;
use crate::traffic_management::algorithms::OriginStrategy;
use crate::traffic_management::selector::OriginCandidate;
use ahash::RandomState;
use rand::RngCore;
use std::hash::Hash;

/// Deterministic, fast hash for routing decisions.
///
/// Fixed seeds:
/// - Stable across restarts
/// - Stable across processes
/// - Not security-sensitive
pub(crate) fn stable_hash<T: Hash>(value: &T) -> u64 {
    static HASHER: RandomState = RandomState::with_seeds(1, 2, 3, 4);
    HASHER.hash_one(value)
}

/// Maps a hash onto the open interval (0, 1).
fn unit_interval(hash: u64) -> f64 {
    ((hash >> 11) as f64 + 0.5) / (1u64 << 53) as f64
}

/// Weighted rendezvous hashing over the client identity.
///
/// The same client lands on the same origin for as long as the usable origin
/// set does not change, and only clients of a removed origin move.
#[derive(Debug, Default)]
pub struct StickyHash;

impl StickyHash {
    fn score(key: &str, pool: &PoolId, candidate: &OriginCandidate<'_>, weighted: bool) -> f64 {
        let u = unit_interval(stable_hash(&(key, pool.as_str(), candidate.origin.name.as_str())));
        if weighted {
            // Logarithmic method: P(win) is proportional to the weight.
            candidate.weight() / -u.ln()
        } else {
            u
        }
    }
}

impl OriginStrategy for StickyHash {
    fn pick(
        &self,
        req: &RequestCtx,
        pool: &PoolId,
        candidates: &[OriginCandidate<'_>],
        _rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let key = req.client_key();
        let weighted = candidates.iter().any(|c| c.weight() > 0.0);

        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, Self::score(key.as_str(), pool, c, weighted)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }
}
