use crate::conf::types::{
    HealthFoldMode, LoadBalancerConfig, PoolConfig, RandomSteeringConfig, RuntimeConfig,
    SteeringPolicy,
};
use crate::conf::validation::{Subject, ValidationReport};
use crate::traffic_management::RuleEngine;
use std::collections::{HashMap, HashSet};

/// Validate a parsed configuration, aggregating every issue into one report.
pub fn validate_config(cfg: &RuntimeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if cfg.engine.health_fold == HealthFoldMode::Region && cfg.engine.required_region.is_none() {
        report.missing_required_region(&Subject::engine());
    }

    let monitors = unique_keys(
        cfg.monitors.iter().map(|m| m.id.as_str()),
        Subject::monitor,
        &mut report,
    );

    let pools = unique_keys(
        cfg.pools.iter().map(PoolConfig::key),
        Subject::pool,
        &mut report,
    );

    unique_keys(
        cfg.load_balancers.iter().map(LoadBalancerConfig::key),
        Subject::load_balancer,
        &mut report,
    );

    for pool in &cfg.pools {
        validate_pool(pool, &monitors, &mut report);
    }

    let pools_by_key: HashMap<&str, &PoolConfig> =
        cfg.pools.iter().map(|p| (p.key(), p)).collect();

    for lb in &cfg.load_balancers {
        validate_load_balancer(lb, &pools, &pools_by_key, &mut report);
    }

    report
}

fn unique_keys<'a>(
    keys: impl Iterator<Item = &'a str>,
    subject: fn(&str) -> Subject,
    report: &mut ValidationReport,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for key in keys {
        if key.is_empty() {
            report.missing_id(&subject(key));
        } else if !seen.insert(key) {
            report.duplicate_id(&subject(key));
        }
    }
    seen
}

fn validate_pool(pool: &PoolConfig, monitors: &HashSet<&str>, report: &mut ValidationReport) {
    let subject = Subject::pool(pool.key());

    if let Some(monitor) = &pool.monitor
        && !monitors.contains(monitor.as_str())
    {
        report.unknown_monitor(monitor, &subject.field("monitor"));
    }

    let mut names = HashSet::new();
    for (i, origin) in pool.origins.iter().enumerate() {
        let origin_subject = subject.field(format!("origins[{}]", i));
        if !origin.weight.is_finite() || origin.weight < 0.0 {
            report.invalid_origin_weight(origin.weight, &origin_subject);
        }
        if !names.insert(origin.name.as_str()) {
            report.duplicate_origin(&origin.name, &origin_subject);
        }
    }

    match (pool.latitude, pool.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                report.invalid_coordinate(lat, 90.0, &subject.field("latitude"));
            }
            if !(-180.0..=180.0).contains(&lon) {
                report.invalid_coordinate(lon, 180.0, &subject.field("longitude"));
            }
        }
        (None, None) => {}
        _ => report.partial_coordinates(&subject),
    }

    if let Some(shedding) = &pool.load_shedding {
        for percent in [shedding.default_percent, shedding.session_percent] {
            if !(0.0..=100.0).contains(&percent) {
                report.invalid_shedding_percent(percent, &subject.field("load_shedding"));
            }
        }
    }

    let enabled = pool.origins.iter().filter(|o| o.enabled).count();
    if enabled == 0 {
        report.no_enabled_origins(&subject);
    } else if enabled < pool.effective_minimum_origins() {
        report.unreachable_minimum_origins(pool.minimum_origins, enabled, &subject);
    }
}

fn validate_load_balancer(
    lb: &LoadBalancerConfig,
    pools: &HashSet<&str>,
    pools_by_key: &HashMap<&str, &PoolConfig>,
    report: &mut ValidationReport,
) {
    let subject = Subject::load_balancer(lb.key());

    if lb.default_pools.is_empty() {
        report.empty_default_pools(&subject.field("default_pools"));
    }

    for pool in lb.referenced_pools() {
        if !pools.contains(pool) {
            report.unknown_pool(pool, &subject);
        }
    }

    if let Some(random) = &lb.random_steering {
        validate_random_steering(random, pools, &subject.field("random_steering"), report);
    }

    if lb.steering_policy == SteeringPolicy::Proximity {
        for pool in &lb.default_pools {
            if let Some(p) = pools_by_key.get(pool.as_str())
                && p.coordinates().is_none()
            {
                report.pool_without_coordinates(pool, &subject.field("default_pools"));
            }
        }
    }

    for (i, rule) in lb.rules.iter().enumerate() {
        let rule_subject = subject.field(format!("rules[{}]", i));

        for pool in rule.overrides.referenced_pools() {
            if !pools.contains(pool) {
                report.unknown_pool(pool, &rule_subject);
            }
        }

        if let Some(random) = &rule.overrides.random_steering {
            validate_random_steering(random, pools, &rule_subject, report);
        }

        if let Some(fixed) = &rule.fixed_response
            && fixed.status_code != 0
            && http::StatusCode::from_u16(fixed.status_code).is_err()
        {
            report.invalid_status_code(fixed.status_code, &rule_subject);
        }
    }

    // Rules after an unconditional terminating rule, in evaluation order, never run.
    let mut terminated = false;
    for i in RuleEngine::evaluation_order(lb) {
        let rule = &lb.rules[i];
        if rule.disabled {
            continue;
        }
        if terminated {
            report.unreachable_rule(&rule.name, &subject.field(format!("rules[{}]", i)));
            continue;
        }
        terminated = rule.condition.trim().is_empty()
            && (rule.terminates || rule.fixed_response.is_some());
    }
}

fn validate_random_steering(
    random: &RandomSteeringConfig,
    pools: &HashSet<&str>,
    subject: &Subject,
    report: &mut ValidationReport,
) {
    for (pool, weight) in &random.pool_weights {
        if !pools.contains(pool.as_str()) {
            report.unknown_pool(pool, subject);
        }
        if !weight.is_finite() || *weight < 0.0 {
            report.invalid_pool_weight(pool, *weight, subject);
        }
    }

    if let Some(weight) = random.default_weight
        && (!weight.is_finite() || weight < 0.0)
    {
        report.invalid_pool_weight("*", weight, subject);
    }
}
