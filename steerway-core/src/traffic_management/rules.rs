use crate::conf::types::{
    DEFAULT_SESSION_AFFINITY_TTL, FixedResponse, GeoPools, LoadBalancerConfig,
    RandomSteeringConfig, RuleConfig, RuleOverrides, SessionAffinity, SessionAffinityAttributes,
    SteeringPolicy,
};
use crate::ctx::RequestCtx;
use crate::traffic_management::{LoadBalancerId, TrafficError, TrafficSnapshot};
use tracing::debug;

/// Load balancer settings after merging the overrides of every matched rule.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub ttl: u32,
    pub fallback_pool: String,
    pub default_pools: Vec<String>,
    pub region_pools: GeoPools,
    pub pop_pools: GeoPools,
    pub country_pools: GeoPools,
    pub steering_policy: SteeringPolicy,
    pub session_affinity: SessionAffinity,
    /// Seconds.
    pub session_affinity_ttl: u32,
    pub session_affinity_attributes: SessionAffinityAttributes,
    pub random_steering: Option<RandomSteeringConfig>,
}

impl EffectiveConfig {
    pub fn from_load_balancer(lb: &LoadBalancerConfig) -> Self {
        Self {
            ttl: lb.ttl,
            fallback_pool: lb.fallback_pool.clone(),
            default_pools: lb.default_pools.clone(),
            region_pools: lb.region_pools.clone(),
            pop_pools: lb.pop_pools.clone(),
            country_pools: lb.country_pools.clone(),
            steering_policy: lb.steering_policy,
            session_affinity: lb.session_affinity,
            session_affinity_ttl: lb
                .session_affinity_ttl
                .unwrap_or(DEFAULT_SESSION_AFFINITY_TTL),
            session_affinity_attributes: lb
                .session_affinity_attributes
                .clone()
                .unwrap_or_default(),
            random_steering: lb.random_steering.clone(),
        }
    }

    /// Present override fields replace the current value. Lists and maps are
    /// replaced wholesale, never merged.
    pub fn apply(&mut self, overrides: &RuleOverrides) {
        if let Some(v) = overrides.session_affinity {
            self.session_affinity = v;
        }
        if let Some(v) = overrides.session_affinity_ttl {
            self.session_affinity_ttl = v;
        }
        if let Some(attrs) = &overrides.session_affinity_attributes {
            let current = &mut self.session_affinity_attributes;
            if attrs.samesite.is_some() {
                current.samesite = attrs.samesite;
            }
            if attrs.secure.is_some() {
                current.secure = attrs.secure;
            }
            if attrs.zero_downtime_failover.is_some() {
                current.zero_downtime_failover = attrs.zero_downtime_failover;
            }
        }
        if let Some(v) = overrides.ttl {
            self.ttl = v;
        }
        if let Some(v) = overrides.steering_policy {
            self.steering_policy = v;
        }
        if let Some(v) = &overrides.fallback_pool {
            self.fallback_pool = v.clone();
        }
        if let Some(v) = &overrides.default_pools {
            self.default_pools = v.clone();
        }
        if let Some(v) = &overrides.pop_pools {
            self.pop_pools = v.clone();
        }
        if let Some(v) = &overrides.region_pools {
            self.region_pools = v.clone();
        }
        if let Some(v) = &overrides.country_pools {
            self.country_pools = v.clone();
        }
        if let Some(v) = &overrides.random_steering {
            self.random_steering = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Scanning,
    /// A matched rule carries a fixed response.
    FixedResponse,
    /// A matched rule set `terminates`.
    Terminated,
    /// Every rule was considered.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct RuleEvaluation<'lb> {
    pub state: RuleState,
    pub config: EffectiveConfig,
    /// Names of the matched rules, in evaluation order.
    pub matched: Vec<&'lb str>,
    pub fixed_response: Option<(&'lb RuleConfig, &'lb FixedResponse)>,
}

/// Ordered rule evaluation against one configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
    snapshot: &'a TrafficSnapshot,
}

impl<'a> RuleEngine<'a> {
    pub fn new(snapshot: &'a TrafficSnapshot) -> Self {
        Self { snapshot }
    }

    /// Rules run by ascending priority, ties in source order.
    pub fn evaluation_order(lb: &LoadBalancerConfig) -> Vec<usize> {
        let mut order: Vec<usize> = (0..lb.rules.len()).collect();
        order.sort_by_key(|&i| lb.rules[i].priority);
        order
    }

    pub fn evaluate<'lb>(
        &self,
        lb: &'lb LoadBalancerConfig,
        req: &RequestCtx,
    ) -> Result<RuleEvaluation<'lb>, TrafficError> {
        let mut eval = RuleEvaluation {
            state: RuleState::Scanning,
            config: EffectiveConfig::from_load_balancer(lb),
            matched: Vec::new(),
            fixed_response: None,
        };

        for i in Self::evaluation_order(lb) {
            let rule = &lb.rules[i];
            if rule.disabled || !req.condition_holds(&rule.condition) {
                continue;
            }

            self.check_overrides(lb, rule)?;
            eval.config.apply(&rule.overrides);
            eval.matched.push(rule.name.as_str());

            debug!(
                event = "rule_matched",
                load_balancer = %lb.key(),
                rule = %rule.name,
                priority = rule.priority,
            );

            if let Some(fixed) = &rule.fixed_response {
                eval.state = RuleState::FixedResponse;
                eval.fixed_response = Some((rule, fixed));
                break;
            }

            if rule.terminates {
                eval.state = RuleState::Terminated;
                break;
            }
        }

        if eval.state == RuleState::Scanning {
            eval.state = RuleState::Exhausted;
        }

        Ok(eval)
    }

    fn check_overrides(
        &self,
        lb: &LoadBalancerConfig,
        rule: &RuleConfig,
    ) -> Result<(), TrafficError> {
        let invalid = |reason: String| TrafficError::InvalidOverride {
            load_balancer: LoadBalancerId::from(lb.key()),
            rule: rule.name.clone(),
            reason,
        };

        if let Some(pool) = rule
            .overrides
            .referenced_pools()
            .find(|pool| self.snapshot.pool(pool).is_none())
        {
            return Err(invalid(format!("unknown pool '{}'", pool)));
        }

        if let Some(random) = &rule.overrides.random_steering {
            for (pool, weight) in &random.pool_weights {
                if self.snapshot.pool(pool).is_none() {
                    return Err(invalid(format!(
                        "random steering weight for unknown pool '{}'",
                        pool
                    )));
                }
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(invalid(format!(
                        "invalid weight {} for pool '{}'",
                        weight, pool
                    )));
                }
            }
            if let Some(weight) = random.default_weight
                && (!weight.is_finite() || weight < 0.0)
            {
                return Err(invalid(format!("invalid default weight {}", weight)));
            }
        }

        Ok(())
    }
}
