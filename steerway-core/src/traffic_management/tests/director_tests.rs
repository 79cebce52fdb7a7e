use crate::conf::types::SteeringPolicy;
use crate::traffic_management::tests::support::*;
use crate::traffic_management::{
    Decision, DecisionReason, FailureReason, LoadBalancerId, OriginId, PoolId, SESSION_COOKIE_NAME,
    ShedScope, TrafficError, TrafficManager,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, Instant};

fn www() -> LoadBalancerId {
    LoadBalancerId::from("www")
}

/// default_pools [A, B], fallback F, every pool probed with one origin.
fn failover_manager() -> TrafficManager {
    manager(
        vec![
            monitored_pool("A", 1),
            monitored_pool("B", 1),
            monitored_pool("F", 1),
        ],
        vec![load_balancer(json!({
            "name": "www", "ttl": 30, "fallback_pool": "F", "default_pools": ["A", "B"]
        }))],
    )
}

fn report(tm: &TrafficManager, pool: &str, origin: &str, up: bool) {
    let obs = if up { healthy(10) } else { unhealthy() };
    observe(tm.health(), pool, origin, "WEU", obs);
}

fn selected(decision: &Decision) -> (&str, &str, DecisionReason) {
    let s = decision.selection().expect("expected a selection");
    (s.pool.as_str(), s.origin.as_str(), s.reason)
}

#[test]
fn unknown_load_balancer_is_an_error() {
    let tm = failover_manager();

    let result = tm.route(&LoadBalancerId::from("missing"), &req(), &mut rng(1));

    assert_eq!(
        result,
        Err(TrafficError::UnknownLoadBalancer(LoadBalancerId::from(
            "missing"
        )))
    );
}

#[test]
fn first_eligible_pool_wins_then_fallback_then_failure() {
    // Arrange
    let tm = failover_manager();
    report(&tm, "A", "A1", false);
    report(&tm, "B", "B1", true);
    report(&tm, "F", "F1", true);

    // Act & Assert: A dead, B alive
    let d = tm.route(&www(), &req(), &mut rng(1)).unwrap();
    assert_eq!(selected(&d), ("B", "B1", DecisionReason::Steering));

    // B dead too
    report(&tm, "B", "B1", false);
    let d = tm.route(&www(), &req(), &mut rng(1)).unwrap();
    assert_eq!(selected(&d), ("F", "F1", DecisionReason::Fallback));

    // Fallback dead
    report(&tm, "F", "F1", false);
    let d = tm.route(&www(), &req(), &mut rng(1)).unwrap();
    assert_eq!(
        d,
        Decision::Failed {
            reason: FailureReason::NoHealthyOrigin
        }
    );
}

#[test]
fn fallback_pool_ignores_minimum_origins() {
    // Arrange
    let mut fallback = monitored_pool("F", 2);
    fallback.minimum_origins = 2;
    let tm = manager(
        vec![monitored_pool("A", 1), fallback],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "F", "default_pools": ["A", "F"]
        }))],
    );
    report(&tm, "F", "F2", true);

    // Act
    let d = tm.route(&www(), &req(), &mut rng(3)).unwrap();

    // Assert
    assert_eq!(selected(&d), ("F", "F2", DecisionReason::Fallback));
}

#[test]
fn selection_carries_origin_details() {
    // Arrange
    let tm = manager(
        vec![pool(json!({
            "name": "A",
            "origins": [{
                "name": "app", "address": "app.internal",
                "header": { "Host": ["www.example.com"] }
            }]
        }))],
        vec![load_balancer(json!({
            "name": "www", "ttl": 30, "fallback_pool": "A", "default_pools": ["A"],
            "rules": [{ "name": "tag", "overrides": { "ttl": 45 } }]
        }))],
    );

    // Act
    let d = tm.route(&www(), &req(), &mut rng(1)).unwrap();

    // Assert
    let s = d.selection().unwrap();
    assert_eq!(s.address, "app.internal");
    assert_eq!(s.headers["Host"], vec!["www.example.com".to_string()]);
    assert_eq!(s.ttl, 45);
    assert_eq!(s.matched_rules, vec!["tag".to_string()]);
    assert_eq!(s.steering_policy, SteeringPolicy::Off);
    assert!(s.session_cookie.is_none());
}

#[test]
fn disabled_load_balancer_fails() {
    let tm = manager(
        vec![monitored_pool("A", 1)],
        vec![load_balancer(json!({
            "name": "www", "enabled": false, "fallback_pool": "A", "default_pools": ["A"]
        }))],
    );

    let d = tm.route(&www(), &req(), &mut rng(1)).unwrap();

    assert_eq!(
        d,
        Decision::Failed {
            reason: FailureReason::LoadBalancerDisabled
        }
    );
}

#[test]
fn fixed_response_rule_short_circuits_routing() {
    // Arrange
    let tm = manager(
        vec![monitored_pool("A", 1)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "rules": [
                { "name": "reroute", "priority": 2, "overrides": { "fallback_pool": "ghost" } },
                {
                    "name": "maintenance", "priority": 1, "condition": "maintenance",
                    "fixed_response": { "message_body": "back soon", "content_type": "text/plain" }
                }
            ]
        }))],
    );

    // Act
    let d = tm
        .route(&www(), &req().with_condition("maintenance", true), &mut rng(1))
        .unwrap();

    // Assert
    match d {
        Decision::FixedResponse {
            rule,
            status,
            response,
        } => {
            assert_eq!(rule, "maintenance");
            assert_eq!(status, 200);
            assert_eq!(response.message_body, "back soon");
        }
        other => panic!("unexpected decision {other:?}"),
    }
}

#[test]
fn invalid_override_aborts_evaluation() {
    let tm = manager(
        vec![monitored_pool("A", 1)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "rules": [{ "name": "reroute", "overrides": { "default_pools": ["ghost"] } }]
        }))],
    );

    let result = tm.route(&www(), &req(), &mut rng(1));

    assert!(matches!(result, Err(TrafficError::InvalidOverride { .. })));
}

#[test]
fn unknown_fallback_pool_is_an_error() {
    let tm = manager(
        vec![monitored_pool("A", 1)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "ghost", "default_pools": ["A"]
        }))],
    );
    report(&tm, "A", "A1", false);

    let result = tm.route(&www(), &req(), &mut rng(1));

    assert_eq!(
        result,
        Err(TrafficError::UnknownPool {
            load_balancer: www(),
            pool: PoolId::from("ghost"),
        })
    );
}

#[test]
fn full_shedding_returns_shed_but_spares_the_fallback() {
    // Arrange
    let shedding_pool = |name: &str, enabled: bool| {
        pool(json!({
            "name": name,
            "load_shedding": { "default_percent": 100.0 },
            "origins": [{ "name": format!("{name}1"), "address": "10.0.0.1", "enabled": enabled }]
        }))
    };
    let tm = manager(
        vec![
            shedding_pool("A", true),
            shedding_pool("D", false),
            shedding_pool("F", true),
        ],
        vec![
            load_balancer(json!({ "name": "www", "fallback_pool": "F", "default_pools": ["A"] })),
            load_balancer(json!({ "name": "api", "fallback_pool": "F", "default_pools": ["D"] })),
        ],
    );

    // Act
    let shed = tm.route(&www(), &req(), &mut rng(1)).unwrap();
    let fallback = tm
        .route(&LoadBalancerId::from("api"), &req(), &mut rng(1))
        .unwrap();

    // Assert
    assert_eq!(
        shed,
        Decision::Shed {
            pool: PoolId::from("A"),
            scope: ShedScope::NewTraffic
        }
    );
    assert_eq!(selected(&fallback), ("F", "F1", DecisionReason::Fallback));
}

#[test]
fn cookie_affinity_pins_and_reuses_the_origin() {
    // Arrange
    let tm = manager(
        vec![pool(json!({
            "name": "A",
            "origins": [
                { "name": "A1", "address": "10.0.0.1" },
                { "name": "A2", "address": "10.0.0.2" },
                { "name": "A3", "address": "10.0.0.3" }
            ]
        }))],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "cookie", "session_affinity_ttl": 300
        }))],
    );
    let t0 = Instant::now();

    // Act
    let first = tm.route_at(&www(), &req(), &mut rng(1), t0).unwrap();
    let cookie = first
        .selection()
        .unwrap()
        .session_cookie
        .clone()
        .unwrap();
    let returning = req().with_affinity_token(cookie.value.clone());

    let later: Vec<Decision> = (0..20)
        .map(|seed| {
            tm.route_at(&www(), &returning, &mut rng(seed), t0 + Duration::from_secs(10))
                .unwrap()
        })
        .collect();

    // Assert
    assert_eq!(cookie.name, SESSION_COOKIE_NAME);
    assert_eq!(cookie.max_age, 300);
    let pinned = first.selection().unwrap().origin.clone();
    for d in &later {
        let s = d.selection().unwrap();
        assert_eq!(s.origin, pinned);
        assert_eq!(s.reason, DecisionReason::SessionAffinity);
        assert!(s.session_cookie.is_none());
    }
}

#[test]
fn pinned_origin_going_down_forces_reselection() {
    // Arrange
    let tm = manager(
        vec![monitored_pool("A", 2)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "header"
        }))],
    );
    report(&tm, "A", "A1", true);
    report(&tm, "A", "A2", true);
    let client = req().with_affinity_token("user-42");
    let t0 = Instant::now();

    let first = tm.route_at(&www(), &client, &mut rng(9), t0).unwrap();
    let pinned = first.selection().unwrap().origin.clone();
    let other = if pinned.as_str() == "A1" { "A2" } else { "A1" };

    // Act
    report(&tm, "A", pinned.as_str(), false);
    let after = tm.route_at(&www(), &client, &mut rng(9), t0).unwrap();

    // Assert
    let s = after.selection().unwrap();
    assert_eq!(s.origin, OriginId::from(other));
    assert_eq!(s.reason, DecisionReason::Steering);
}

#[test]
fn sticky_failover_keeps_serving_a_drained_origin() {
    // Arrange
    let tm = manager(
        vec![monitored_pool("A", 2)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "header",
            "session_affinity_attributes": { "zero_downtime_failover": "sticky", "drain_duration": 60 }
        }))],
    );
    report(&tm, "A", "A1", true);
    report(&tm, "A", "A2", true);
    let client = req().with_affinity_token("user-7");
    let t0 = Instant::now();

    let first = tm.route_at(&www(), &client, &mut rng(2), t0).unwrap();
    let pinned = first.selection().unwrap().origin.clone();

    // Act
    report(&tm, "A", pinned.as_str(), false);
    let during = tm
        .route_at(&www(), &client, &mut rng(2), t0 + Duration::from_secs(1))
        .unwrap();
    let after = tm
        .route_at(&www(), &client, &mut rng(2), t0 + Duration::from_secs(62))
        .unwrap();

    // Assert
    assert_eq!(during.selection().unwrap().origin, pinned);
    assert_eq!(
        during.selection().unwrap().reason,
        DecisionReason::SessionAffinity
    );
    assert_ne!(after.selection().unwrap().origin, pinned);
}

#[test]
fn temporary_failover_returns_to_the_recovered_origin() {
    // Arrange
    let tm = manager(
        vec![monitored_pool("A", 2)],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "header",
            "session_affinity_attributes": { "zero_downtime_failover": "temporary" }
        }))],
    );
    report(&tm, "A", "A1", true);
    report(&tm, "A", "A2", true);
    let client = req().with_affinity_token("user-3");
    let t0 = Instant::now();

    let first = tm.route_at(&www(), &client, &mut rng(4), t0).unwrap();
    let pinned = first.selection().unwrap().origin.clone();
    let other = if pinned.as_str() == "A1" { "A2" } else { "A1" };

    // Act
    report(&tm, "A", pinned.as_str(), false);
    let during = tm
        .route_at(&www(), &client, &mut rng(4), t0 + Duration::from_secs(1))
        .unwrap();

    report(&tm, "A", pinned.as_str(), true);
    let after = tm
        .route_at(&www(), &client, &mut rng(4), t0 + Duration::from_secs(2))
        .unwrap();

    // Assert
    assert_eq!(selected(&during), ("A", other, DecisionReason::Steering));
    assert_eq!(tm.sessions().len(), 1);
    let s = after.selection().unwrap();
    assert_eq!(s.origin, pinned);
    assert_eq!(s.reason, DecisionReason::SessionAffinity);
}

#[test]
fn one_off_cookie_clients_do_not_accumulate_pins() {
    // Arrange
    let tm = manager(
        vec![pool(json!({
            "name": "A",
            "origins": [{ "name": "A1", "address": "10.0.0.1" }]
        }))],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "cookie", "session_affinity_ttl": 1
        }))],
    );
    let t0 = Instant::now();

    // Act
    for i in 0..1_000u64 {
        tm.route_at(&www(), &req(), &mut rng(i), t0 + Duration::from_secs(i * 10))
            .unwrap();
    }

    // Assert
    assert!(tm.sessions().len() <= 256, "pins kept: {}", tm.sessions().len());
}

#[test]
fn session_shedding_applies_to_pinned_requests() {
    // Arrange
    let tm = manager(
        vec![pool(json!({
            "name": "A",
            "load_shedding": { "session_percent": 100.0 },
            "origins": [{ "name": "A1", "address": "10.0.0.1" }]
        }))],
        vec![load_balancer(json!({
            "name": "www", "fallback_pool": "A", "default_pools": ["A"],
            "session_affinity": "header"
        }))],
    );
    let client = req().with_affinity_token("user-1");
    let t0 = Instant::now();

    // Act
    let first = tm.route_at(&www(), &client, &mut rng(1), t0).unwrap();
    let second = tm.route_at(&www(), &client, &mut rng(1), t0).unwrap();

    // Assert
    assert!(first.selection().is_some());
    assert_eq!(
        second,
        Decision::Shed {
            pool: PoolId::from("A"),
            scope: ShedScope::Session
        }
    );
}

#[test]
fn decisions_serialize_with_a_tag() {
    let d = Decision::Failed {
        reason: FailureReason::NoHealthyOrigin,
    };

    let value = serde_json::to_value(&d).unwrap();

    assert_eq!(
        value,
        json!({ "decision": "failed", "reason": "no_healthy_origin" })
    );
}
