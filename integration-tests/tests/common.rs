#![allow(dead_code)]

use integration_tests::harness::ConfigDir;
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};
use steerway_core::ctx::RequestCtx;

/// Two regional pools steered by country, plus a fallback pool.
pub fn geo_config() -> ConfigDir {
    let cfg = ConfigDir::with_entrypoint(
        r#"
        engine {
          health_fold = "majority"
        }
        "#,
    );

    cfg.monitor("http-check")
        .pool(json!({
            "name": "eu",
            "monitor": "http-check",
            "latitude": 50.1,
            "longitude": 8.7,
            "origins": [
                { "name": "eu1", "address": "10.1.0.1" },
                { "name": "eu2", "address": "10.1.0.2" }
            ]
        }))
        .pool(json!({
            "name": "us",
            "monitor": "http-check",
            "latitude": 39.0,
            "longitude": -77.5,
            "origins": [{ "name": "us1", "address": "10.2.0.1" }]
        }))
        .pool(json!({
            "name": "fallback",
            "origins": [{ "name": "static", "address": "static.example.net" }]
        }))
        .load_balancer(json!({
            "name": "www",
            "ttl": 30,
            "fallback_pool": "fallback",
            "default_pools": ["us", "eu"],
            "country_pools": { "DE": ["eu", "us"] },
            "rules": [{
                "name": "beta",
                "condition": "http.request.uri.path contains \"/beta\"",
                "overrides": { "default_pools": ["eu"], "ttl": 5 }
            }]
        }));

    cfg
}

pub fn client(last_octet: u8) -> RequestCtx {
    RequestCtx::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, last_octet)))
}
