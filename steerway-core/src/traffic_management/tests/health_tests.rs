use crate::traffic_management::tests::support::*;
use crate::traffic_management::{
    HealthFoldPolicy, HealthRegistry, HealthVerdict, OriginId, PoolId, RegionCode,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

fn verdict(registry: &HealthRegistry) -> HealthVerdict {
    registry.verdict(&PoolId::from("a"), &OriginId::from("a1"))
}

#[test]
fn missing_observation_is_unknown_and_unhealthy() {
    let registry = HealthRegistry::default();

    let v = verdict(&registry);

    assert_eq!(v, HealthVerdict::Unknown);
    assert!(!v.is_healthy());
}

#[test]
fn majority_requires_strictly_more_than_half() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::Majority);
    observe(&registry, "a", "a1", "WEU", healthy(40));
    observe(&registry, "a", "a1", "ENAM", unhealthy());

    // Act & Assert
    assert_eq!(verdict(&registry), HealthVerdict::Unhealthy);

    observe(&registry, "a", "a1", "WNAM", healthy(25));
    assert_eq!(
        verdict(&registry),
        HealthVerdict::Healthy {
            rtt: Some(Duration::from_millis(25))
        }
    );
}

#[test]
fn any_healthy_needs_one_region() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::AnyHealthy);
    observe(&registry, "a", "a1", "WEU", unhealthy());
    observe(&registry, "a", "a1", "ENAM", unhealthy());
    observe(&registry, "a", "a1", "SEAS", healthy(90));

    // Act
    let v = verdict(&registry);

    // Assert
    assert_eq!(v.rtt(), Some(Duration::from_millis(90)));
}

#[test]
fn required_region_decides_alone() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::RequireRegion(RegionCode::from("WEU")));
    observe(&registry, "a", "a1", "ENAM", healthy(10));
    observe(&registry, "a", "a1", "WNAM", healthy(10));

    // Act & Assert
    assert_eq!(verdict(&registry), HealthVerdict::Unknown);

    observe(&registry, "a", "a1", "WEU", unhealthy());
    assert_eq!(verdict(&registry), HealthVerdict::Unhealthy);
}

#[test]
fn observe_overwrites_the_same_region() {
    // Arrange
    let registry = HealthRegistry::default();
    observe(&registry, "a", "a1", "WEU", unhealthy());

    // Act
    observe(&registry, "a", "a1", "WEU", healthy(5));

    // Assert
    assert!(verdict(&registry).is_healthy());
    assert_eq!(
        registry
            .observations(&PoolId::from("a"), &OriginId::from("a1"))
            .len(),
        1
    );
}

#[test]
fn unmonitored_pools_are_healthy_without_rtt() {
    // Arrange
    let registry = HealthRegistry::default();
    let p = pool(json!({ "name": "a", "origins": [{ "name": "a1", "address": "10.0.0.1" }] }));

    // Act
    let v = registry.verdict_for(&p, &p.origins[0]);

    // Assert
    assert_eq!(v, HealthVerdict::Healthy { rtt: None });
}

#[test]
fn check_regions_limit_the_fold() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::AnyHealthy);
    let p = pool(json!({
        "name": "a",
        "monitor": "http",
        "check_regions": ["WEU"],
        "origins": [{ "name": "a1", "address": "10.0.0.1" }]
    }));
    observe(&registry, "a", "a1", "WEU", unhealthy());
    observe(&registry, "a", "a1", "ENAM", healthy(10));

    // Act
    let v = registry.verdict_for(&p, &p.origins[0]);

    // Assert
    assert_eq!(v, HealthVerdict::Unhealthy);
}

#[test]
fn fold_policy_can_be_swapped() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::Majority);
    observe(&registry, "a", "a1", "WEU", healthy(10));
    observe(&registry, "a", "a1", "ENAM", unhealthy());
    assert!(!verdict(&registry).is_healthy());

    // Act
    registry.set_fold_policy(HealthFoldPolicy::AnyHealthy);

    // Assert
    assert!(verdict(&registry).is_healthy());
}

#[test]
fn retain_pools_drops_removed_origins() {
    // Arrange
    let registry = HealthRegistry::default();
    observe(&registry, "a", "a1", "WEU", healthy(10));
    observe(&registry, "b", "b1", "WEU", healthy(10));

    // Act
    registry.retain_pools(|pool, _| pool.as_str() == "a");

    // Assert
    assert_eq!(registry.len(), 1);
    assert!(verdict(&registry).is_healthy());
}

#[test]
fn concurrent_writers_are_all_recorded() {
    // Arrange
    let registry = HealthRegistry::new(HealthFoldPolicy::AnyHealthy);
    let regions: Vec<String> = (0..16).map(|i| format!("R{i}")).collect();

    // Act
    std::thread::scope(|s| {
        for region in &regions {
            let registry = &registry;
            s.spawn(move || {
                for ms in 0..50 {
                    observe(registry, "a", "a1", region, healthy(100 - ms));
                }
            });
        }
    });

    // Assert
    let observations = registry.observations(&PoolId::from("a"), &OriginId::from("a1"));
    assert_eq!(observations.len(), 16);
    assert!(
        observations
            .values()
            .all(|o| o.rtt == Some(Duration::from_millis(51)))
    );
    assert_eq!(verdict(&registry).rtt(), Some(Duration::from_millis(51)));
}
