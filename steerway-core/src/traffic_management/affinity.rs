use crate::conf::types::{SameSite, Secure, SessionAffinity, ZeroDowntimeFailover};
use crate::ctx::RequestCtx;
use crate::traffic_management::algorithms::stable_hash;
use crate::traffic_management::rules::EffectiveConfig;
use crate::traffic_management::{ClientKey, LoadBalancerId, OriginId, PoolId};
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Builder;

/// Cookie carrying the affinity token in `cookie` and `ip_cookie` modes.
pub const SESSION_COOKIE_NAME: &str = "__swlb";

/// Binds between two sweeps of expired pins.
const PURGE_EVERY: u64 = 256;

/// Binding of a client to an origin of one load balancer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPin {
    pub client: ClientKey,
    pub load_balancer: LoadBalancerId,
    pub pool: PoolId,
    pub origin: OriginId,
    pub issued_at: Instant,
    pub expires_at: Instant,
    pub failover: ZeroDowntimeFailover,
    pub drain_duration: Duration,
    pub drained_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinStatus {
    Valid,
    /// Kept, but not honoured until its origin is usable again.
    Suspended,
    Invalid,
}

impl SessionPin {
    pub fn is_drained(&self) -> bool {
        self.drained_at.is_some()
    }

    pub fn references(&self, pool: &PoolId, origin: &OriginId) -> bool {
        self.pool == *pool && self.origin == *origin
    }

    fn status(&self, now: Instant) -> PinStatus {
        if now > self.expires_at {
            return PinStatus::Invalid;
        }

        let Some(drained_at) = self.drained_at else {
            return PinStatus::Valid;
        };

        match self.failover {
            ZeroDowntimeFailover::None => PinStatus::Invalid,
            ZeroDowntimeFailover::Temporary => PinStatus::Suspended,
            ZeroDowntimeFailover::Sticky => {
                if now < drained_at + self.drain_duration {
                    PinStatus::Valid
                } else {
                    PinStatus::Invalid
                }
            }
        }
    }
}

/// Lifetime and drain behaviour recorded on a pin when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPolicy {
    pub ttl: Duration,
    pub failover: ZeroDowntimeFailover,
    pub drain_duration: Duration,
}

impl PinPolicy {
    pub fn from_config(cfg: &EffectiveConfig) -> Self {
        let attrs = &cfg.session_affinity_attributes;
        Self {
            ttl: Duration::from_secs(u64::from(cfg.session_affinity_ttl)),
            failover: attrs.zero_downtime_failover.unwrap_or_default(),
            drain_duration: Duration::from_secs(u64::from(attrs.drain_duration.unwrap_or(0))),
        }
    }
}

/// Cookie the edge should set on the response to keep the client pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
    /// Seconds.
    pub max_age: u32,
    pub samesite: SameSite,
    pub secure: Secure,
}

impl SessionCookie {
    pub fn new(value: String, cfg: &EffectiveConfig) -> Self {
        let attrs = &cfg.session_affinity_attributes;
        Self {
            name: SESSION_COOKIE_NAME,
            value,
            max_age: cfg.session_affinity_ttl,
            samesite: attrs.samesite.unwrap_or_default(),
            secure: attrs.secure.unwrap_or_default(),
        }
    }
}

/// How a request is recognised across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityIdentity {
    pub key: ClientKey,
    /// The client presented no token; one must be handed out in a cookie.
    pub issue_cookie: bool,
}

impl AffinityIdentity {
    /// `cookie` and `header` use the presented token. Cookie mode mints a
    /// random token from `rng` when none is presented; `ip_cookie` derives one
    /// from the client IP. Header mode without a token has no identity.
    pub fn resolve(
        mode: SessionAffinity,
        req: &RequestCtx,
        rng: &mut dyn RngCore,
    ) -> Option<Self> {
        let presented = req
            .affinity_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(|token| Self {
                key: ClientKey::from(token),
                issue_cookie: false,
            });

        match mode {
            SessionAffinity::None => None,
            SessionAffinity::Header => presented,
            SessionAffinity::Cookie => presented.or_else(|| {
                let mut bytes = [0u8; 16];
                rng.fill_bytes(&mut bytes);
                let token = Builder::from_random_bytes(bytes).into_uuid();
                Some(Self {
                    key: ClientKey(token.to_string()),
                    issue_cookie: true,
                })
            }),
            SessionAffinity::IpCookie => presented.or_else(|| {
                Some(Self {
                    key: ClientKey(format!("{:016x}", stable_hash(&req.client_ip))),
                    issue_cookie: true,
                })
            }),
        }
    }
}

/// Session pins keyed by (client identity, load balancer).
///
/// Updates are atomic per key and the last writer wins.
#[derive(Debug, Default)]
pub struct SessionAffinityManager {
    pins: DashMap<(ClientKey, LoadBalancerId), SessionPin>,
    binds: AtomicU64,
}

/// Outcome of looking up the pin of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PinLookup {
    /// The pin is honoured.
    Honoured(SessionPin),
    /// A `temporary` pin waits for its origin. It must not be overwritten.
    Suspended,
    Absent,
}

impl PinLookup {
    pub fn honoured(self) -> Option<SessionPin> {
        match self {
            PinLookup::Honoured(pin) => Some(pin),
            _ => None,
        }
    }
}

impl SessionAffinityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, client: &ClientKey, lb: &LoadBalancerId) -> Option<SessionPin> {
        self.resolve_at(client, lb, Instant::now())
    }

    /// The pin for the key when it is honoured at `now`. Expired and
    /// invalidated pins are removed; suspended pins are kept.
    pub fn resolve_at(
        &self,
        client: &ClientKey,
        lb: &LoadBalancerId,
        now: Instant,
    ) -> Option<SessionPin> {
        let key = (client.clone(), lb.clone());

        let status = {
            let pin = self.pins.get(&key)?;
            match pin.status(now) {
                PinStatus::Valid => return Some(pin.value().clone()),
                status => status,
            }
        };

        if status == PinStatus::Invalid {
            self.remove_invalid(&key, now);
        }
        None
    }

    /// Like [`resolve_at`](Self::resolve_at), first draining the pin when its
    /// origin is no longer usable. A `temporary` pin resumes once its origin
    /// is usable again.
    pub fn resolve_checked(
        &self,
        client: &ClientKey,
        lb: &LoadBalancerId,
        now: Instant,
        is_usable: impl Fn(&PoolId, &OriginId) -> bool,
    ) -> PinLookup {
        let key = (client.clone(), lb.clone());

        let status = {
            let Some(mut pin) = self.pins.get_mut(&key) else {
                return PinLookup::Absent;
            };
            let usable = is_usable(&pin.pool, &pin.origin);

            if !usable && pin.drained_at.is_none() {
                pin.drained_at = Some(now);
                info!(
                    event = "session_drained",
                    load_balancer = %pin.load_balancer,
                    pool = %pin.pool,
                    origin = %pin.origin,
                    failover = ?pin.failover,
                );
            } else if usable
                && pin.failover == ZeroDowntimeFailover::Temporary
                && pin.drained_at.is_some()
            {
                pin.drained_at = None;
            }

            match pin.status(now) {
                PinStatus::Valid => return PinLookup::Honoured(pin.value().clone()),
                status => status,
            }
        };

        match status {
            PinStatus::Suspended => PinLookup::Suspended,
            _ => {
                self.remove_invalid(&key, now);
                PinLookup::Absent
            }
        }
    }

    pub fn bind(
        &self,
        client: ClientKey,
        lb: LoadBalancerId,
        pool: PoolId,
        origin: OriginId,
        policy: PinPolicy,
    ) -> SessionPin {
        self.bind_at(client, lb, pool, origin, policy, Instant::now())
    }

    /// Create or overwrite the pin for (client, lb).
    pub fn bind_at(
        &self,
        client: ClientKey,
        lb: LoadBalancerId,
        pool: PoolId,
        origin: OriginId,
        policy: PinPolicy,
        now: Instant,
    ) -> SessionPin {
        let pin = SessionPin {
            client: client.clone(),
            load_balancer: lb.clone(),
            pool,
            origin,
            issued_at: now,
            expires_at: now + policy.ttl,
            failover: policy.failover,
            drain_duration: policy.drain_duration,
            drained_at: None,
        };

        self.pins.insert((client, lb), pin.clone());

        // Minted cookie tokens are rarely presented again, so lookups alone
        // never reach their pins.
        if self.binds.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired(now);
        }

        pin
    }

    pub fn drain(&self, pool: &PoolId, origin: &OriginId) -> usize {
        self.drain_at(pool, origin, Instant::now())
    }

    /// Mark every pin on the origin as drained and drop the ones their
    /// policy invalidates right away. Returns the number of pins marked.
    pub fn drain_at(&self, pool: &PoolId, origin: &OriginId, now: Instant) -> usize {
        let mut drained = 0;

        self.pins.retain(|_, pin| {
            if pin.references(pool, origin) && pin.drained_at.is_none() {
                pin.drained_at = Some(now);
                drained += 1;
            }
            pin.status(now) != PinStatus::Invalid
        });

        if drained > 0 {
            info!(
                event = "origin_drained",
                pool = %pool,
                origin = %origin,
                pins = drained,
            );
        }

        drained
    }

    /// Drop pins rejected by `keep`, e.g. for load balancers removed by a reload.
    pub fn retain(&self, keep: impl Fn(&SessionPin) -> bool) {
        self.pins.retain(|_, pin| keep(pin));
    }

    /// Drop every pin that is no longer honoured at `now`. Returns the
    /// number of pins removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.pins.len();
        self.pins
            .retain(|_, pin| pin.status(now) != PinStatus::Invalid);
        let purged = before.saturating_sub(self.pins.len());

        if purged > 0 {
            debug!(event = "pins_purged", pins = purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    fn remove_invalid(&self, key: &(ClientKey, LoadBalancerId), now: Instant) {
        // A concurrent bind may have replaced the pin in the meantime.
        self.pins
            .remove_if(key, |_, pin| pin.status(now) == PinStatus::Invalid);
    }
}
