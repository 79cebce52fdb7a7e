use crate::traffic_management::tests::support::*;
use crate::traffic_management::{ShedScope, should_shed};
use serde_json::json;

fn shedding_pool(shedding: serde_json::Value) -> crate::conf::types::PoolConfig {
    pool(json!({ "name": "a", "origins": [], "load_shedding": shedding }))
}

#[test]
fn pools_without_shedding_never_shed() {
    let p = pool(json!({ "name": "a", "origins": [] }));

    assert!(!should_shed(&p, ShedScope::NewTraffic, &req(), &mut rng(1)));
}

#[test]
fn bounds_are_exact() {
    let none = shedding_pool(json!({ "default_percent": 0.0, "session_percent": 100.0 }));

    for seed in 0..100 {
        assert!(!should_shed(&none, ShedScope::NewTraffic, &req(), &mut rng(seed)));
        assert!(should_shed(&none, ShedScope::Session, &req(), &mut rng(seed)));
    }
}

#[test]
fn random_policy_sheds_the_configured_share() {
    // Arrange
    let p = shedding_pool(json!({ "default_percent": 30.0, "default_policy": "random" }));
    let mut rng = rng(42);
    let trials = 20_000;

    // Act
    let shed = (0..trials)
        .filter(|_| should_shed(&p, ShedScope::NewTraffic, &req(), &mut rng))
        .count();

    // Assert
    let share = shed as f64 / trials as f64;
    assert!((share - 0.30).abs() < 0.02, "{share}");
}

#[test]
fn hash_policy_is_deterministic_per_client() {
    // Arrange
    let p = shedding_pool(json!({ "session_percent": 50.0, "session_policy": "hash" }));
    let trials = 4_000;

    // Act
    let mut shed = 0;
    for i in 0..trials {
        let client = req().with_affinity_token(format!("client-{i}"));
        let first = should_shed(&p, ShedScope::Session, &client, &mut rng(i));
        for seed in 1..5 {
            assert_eq!(
                first,
                should_shed(&p, ShedScope::Session, &client, &mut rng(i * 10 + seed))
            );
        }
        shed += usize::from(first);
    }

    // Assert
    let share = shed as f64 / trials as f64;
    assert!((share - 0.5).abs() < 0.05, "{share}");
}
