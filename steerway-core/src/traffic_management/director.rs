use crate::conf::types::{OriginConfig, PoolConfig};
use crate::ctx::RequestCtx;
use crate::traffic_management::affinity::{AffinityIdentity, PinLookup, PinPolicy, SessionCookie};
use crate::traffic_management::decision::{Decision, DecisionReason, FailureReason, Selection};
use crate::traffic_management::rules::{EffectiveConfig, RuleEngine};
use crate::traffic_management::shedding::{ShedScope, should_shed};
use crate::traffic_management::steering::SteeringEngine;
use crate::traffic_management::{
    LoadBalancerId, OriginId, PoolId, PoolSelector, TrafficError, TrafficManager,
    TrafficSnapshot,
};
use rand::RngCore;
use std::time::Instant;
use tracing::{debug, warn};

/// Per-request routing: rules, session affinity, steering, fallback.
#[derive(Debug, Default)]
pub struct TrafficDirector;

/// Everything fixed for the rest of one request once rules have run.
struct Route<'r> {
    lb_id: &'r LoadBalancerId,
    cfg: &'r EffectiveConfig,
    matched_rules: Vec<String>,
    identity: Option<AffinityIdentity>,
    /// A suspended `temporary` pin exists and must outlive this request.
    keep_pin: bool,
    now: Instant,
}

impl TrafficDirector {
    pub fn decide(
        &self,
        req: &RequestCtx,
        snapshot: &TrafficSnapshot,
        lb_id: &LoadBalancerId,
        traffic_manager: &TrafficManager,
        rng: &mut dyn RngCore,
        now: Instant,
    ) -> Result<Decision, TrafficError> {
        let lb = snapshot
            .load_balancer(lb_id.as_str())
            .ok_or_else(|| TrafficError::UnknownLoadBalancer(lb_id.clone()))?;

        if !lb.is_enabled() {
            warn!(event = "load_balancer_disabled", load_balancer = %lb_id);
            return Ok(Decision::Failed {
                reason: FailureReason::LoadBalancerDisabled,
            });
        }

        let eval = RuleEngine::new(snapshot).evaluate(lb, req)?;

        if let Some((rule, fixed)) = eval.fixed_response {
            return Ok(Decision::FixedResponse {
                rule: rule.name.clone(),
                status: fixed.effective_status(),
                response: fixed.clone(),
            });
        }

        let mut route = Route {
            lb_id,
            cfg: &eval.config,
            matched_rules: eval.matched.iter().map(|r| r.to_string()).collect(),
            identity: AffinityIdentity::resolve(eval.config.session_affinity, req, rng),
            keep_pin: false,
            now,
        };

        let selector = PoolSelector::new(traffic_manager.health());

        // Existing session pin.
        if let Some(identity) = &route.identity {
            let lookup = traffic_manager.sessions().resolve_checked(
                &identity.key,
                lb_id,
                now,
                |pool, origin| {
                    snapshot
                        .pool(pool.as_str())
                        .is_some_and(|p| selector.origin_usable(p, origin.as_str()))
                },
            );

            route.keep_pin = matches!(lookup, PinLookup::Suspended);

            if let Some(pin) = lookup.honoured()
                && let Some((pool, origin)) = Self::pinned_origin(snapshot, &pin.pool, &pin.origin)
            {
                if should_shed(pool, ShedScope::Session, req, rng) {
                    debug!(event = "load_shed", pool = %pin.pool, scope = "session");
                    return Ok(Decision::Shed {
                        pool: pin.pool,
                        scope: ShedScope::Session,
                    });
                }

                return Ok(Decision::Selected(Self::selection(
                    &route,
                    pool,
                    origin,
                    DecisionReason::SessionAffinity,
                )));
            }
        }

        let candidates =
            SteeringEngine::new(snapshot, selector).candidate_pools(lb_id, route.cfg, req, rng)?;

        for pool_id in candidates {
            let pool = Self::pool(snapshot, lb_id, pool_id)?;

            if !selector.eligible(pool) {
                debug!(event = "pool_ineligible", load_balancer = %lb_id, pool = %pool_id);
                continue;
            }

            if should_shed(pool, ShedScope::NewTraffic, req, rng) {
                debug!(event = "load_shed", pool = %pool_id, scope = "new_traffic");
                return Ok(Decision::Shed {
                    pool: PoolId::from(pool_id),
                    scope: ShedScope::NewTraffic,
                });
            }

            if let Ok(candidate) = selector.select(pool, req, rng) {
                return Ok(self.bind(
                    &route,
                    traffic_manager,
                    pool,
                    candidate.origin,
                    DecisionReason::Steering,
                ));
            }
        }

        // Every candidate was ineligible. The fallback pool is never shed.
        let fallback = Self::pool(snapshot, lb_id, &route.cfg.fallback_pool)?;
        debug!(event = "fallback_pool", load_balancer = %lb_id, pool = %route.cfg.fallback_pool);

        match selector.select_any(fallback, req, rng) {
            Ok(candidate) => Ok(self.bind(
                &route,
                traffic_manager,
                fallback,
                candidate.origin,
                DecisionReason::Fallback,
            )),
            Err(_) => {
                warn!(
                    event = "no_healthy_origin",
                    load_balancer = %lb_id,
                    fallback_pool = %route.cfg.fallback_pool,
                );
                Ok(Decision::Failed {
                    reason: FailureReason::NoHealthyOrigin,
                })
            }
        }
    }

    fn pool<'s>(
        snapshot: &'s TrafficSnapshot,
        lb_id: &LoadBalancerId,
        pool: &str,
    ) -> Result<&'s PoolConfig, TrafficError> {
        snapshot
            .pool(pool)
            .map(|p| p.as_ref())
            .ok_or_else(|| TrafficError::UnknownPool {
                load_balancer: lb_id.clone(),
                pool: PoolId::from(pool),
            })
    }

    fn pinned_origin<'s>(
        snapshot: &'s TrafficSnapshot,
        pool: &PoolId,
        origin: &OriginId,
    ) -> Option<(&'s PoolConfig, &'s OriginConfig)> {
        let pool = snapshot.pool(pool.as_str())?;
        let origin = pool.origins.iter().find(|o| o.name == origin.as_str())?;
        Some((pool.as_ref(), origin))
    }

    /// Record a session pin when affinity is on, then build the selection.
    fn bind(
        &self,
        route: &Route<'_>,
        traffic_manager: &TrafficManager,
        pool: &PoolConfig,
        origin: &OriginConfig,
        reason: DecisionReason,
    ) -> Decision {
        let mut selection = Self::selection(route, pool, origin, reason);

        if let Some(identity) = &route.identity
            && !route.keep_pin
        {
            traffic_manager.sessions().bind_at(
                identity.key.clone(),
                route.lb_id.clone(),
                selection.pool.clone(),
                selection.origin.clone(),
                PinPolicy::from_config(route.cfg),
                route.now,
            );

            if identity.issue_cookie {
                selection.session_cookie =
                    Some(SessionCookie::new(identity.key.to_string(), route.cfg));
            }
        }

        Decision::Selected(selection)
    }

    fn selection(
        route: &Route<'_>,
        pool: &PoolConfig,
        origin: &OriginConfig,
        reason: DecisionReason,
    ) -> Selection {
        Selection {
            pool: PoolId::from(pool.key()),
            origin: OriginId::from(origin.name.as_str()),
            address: origin.address.clone(),
            headers: origin.header.clone(),
            reason,
            steering_policy: SteeringEngine::resolve_policy(route.cfg),
            ttl: route.cfg.ttl,
            matched_rules: route.matched_rules.clone(),
            session_cookie: None,
        }
    }
}
