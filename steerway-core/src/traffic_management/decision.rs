use crate::conf::types::{FixedResponse, SteeringPolicy};
use crate::traffic_management::{OriginId, PoolId, SessionCookie, ShedScope};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// A rule answered the request directly.
    FixedResponse {
        rule: String,
        status: u16,
        response: FixedResponse,
    },

    /// The chosen pool shed the request.
    Shed { pool: PoolId, scope: ShedScope },

    Selected(Selection),

    Failed { reason: FailureReason },
}

impl Decision {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Decision::Selected(selection) => Some(selection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub pool: PoolId,
    pub origin: OriginId,
    pub address: String,

    /// Request headers configured on the origin.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,

    pub reason: DecisionReason,
    pub steering_policy: SteeringPolicy,

    /// DNS TTL of the answer, in seconds. Zero means automatic.
    pub ttl: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_rules: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<SessionCookie>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// First eligible candidate pool.
    Steering,
    /// An existing session pin.
    SessionAffinity,
    /// No candidate pool was eligible.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NoHealthyOrigin,
    LoadBalancerDisabled,
}
