use integration_tests::harness::init_test_tracing;
use rand::SeedableRng;
use rand::rngs::StdRng;
use steerway_core::traffic_management::{Decision, FailureReason, LoadBalancerId};
use tracing::Level;

mod common;

#[test]
fn engine_logs_structured_events() {
    // Arrange
    let events = init_test_tracing();
    let cfg = common::geo_config();

    // Act
    let tm = cfg.manager();
    let d = tm
        .route(
            &LoadBalancerId::from("www"),
            &common::client(1),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();

    // Assert
    assert!(d.selection().is_some());

    let swapped = events.named("config_swapped");
    assert!(!swapped.is_empty());
    assert_eq!(swapped[0].level, Level::INFO);
    assert_eq!(swapped[0].field("pools"), Some("3"));

    let fallback = events.named("fallback_pool");
    assert!(fallback.iter().any(|e| e.field("pool") == Some("fallback")));

    let ineligible = events.named("pool_ineligible");
    assert!(ineligible.len() >= 2);
}

#[test]
fn missing_fallback_origins_warn() {
    // Arrange
    let events = init_test_tracing();
    let cfg = common::geo_config();
    cfg.pool(serde_json::json!({
        "name": "fallback",
        "origins": [{ "name": "static", "address": "static.example.net", "enabled": false }]
    }));
    let tm = cfg.manager();

    // Act
    let d = tm
        .route(
            &LoadBalancerId::from("www"),
            &common::client(2),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();

    // Assert
    assert_eq!(
        d,
        Decision::Failed {
            reason: FailureReason::NoHealthyOrigin
        }
    );
    let warned = events.named("no_healthy_origin");
    assert!(warned.iter().any(|e| e.level == Level::WARN));
}
