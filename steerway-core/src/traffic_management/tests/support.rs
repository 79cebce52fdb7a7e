//-----------------------------------------------------------------------------
// Test helpers
//-----------------------------------------------------------------------------
use crate::conf::types::{LoadBalancerConfig, PoolConfig};
use crate::ctx::RequestCtx;
use crate::traffic_management::{
    HealthObservation, HealthRegistry, OriginId, PoolId, RegionCode, TrafficManager,
    TrafficSnapshot,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub fn pool(value: Value) -> PoolConfig {
    serde_json::from_value(value).unwrap()
}

pub fn load_balancer(value: Value) -> LoadBalancerConfig {
    serde_json::from_value(value).unwrap()
}

/// A probed pool whose origins are named `<name>1`, `<name>2`, ...
pub fn monitored_pool(name: &str, origins: usize) -> PoolConfig {
    let origins: Vec<Value> = (1..=origins)
        .map(|i| json!({ "name": format!("{name}{i}"), "address": format!("10.0.{}.{i}", name.len()) }))
        .collect();

    pool(json!({ "name": name, "monitor": "http", "origins": origins }))
}

pub fn req() -> RequestCtx {
    RequestCtx::new(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1)))
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn healthy(ms: u64) -> HealthObservation {
    HealthObservation::healthy(Duration::from_millis(ms))
}

pub fn unhealthy() -> HealthObservation {
    HealthObservation::unhealthy("connection refused")
}

pub fn observe(
    registry: &HealthRegistry,
    pool: &str,
    origin: &str,
    region: &str,
    obs: HealthObservation,
) {
    registry.observe(
        PoolId::from(pool),
        OriginId::from(origin),
        RegionCode::from(region),
        obs,
    );
}

pub fn manager(pools: Vec<PoolConfig>, load_balancers: Vec<LoadBalancerConfig>) -> TrafficManager {
    let snapshot = pools
        .into_iter()
        .fold(TrafficSnapshot::default(), TrafficSnapshot::with_pool);
    let snapshot = load_balancers
        .into_iter()
        .fold(snapshot, TrafficSnapshot::with_load_balancer);

    TrafficManager::new(snapshot)
}
