use crate::traffic_management::{ClientKey, Coordinates};
use std::collections::HashMap;
use std::net::IpAddr;

/// Everything the engine knows about one request.
///
/// Geo attributes are resolved by the caller (e.g. from a GeoIP lookup at the
/// edge). Rule conditions are evaluated outside the engine and supplied here as
/// booleans keyed by the condition expression.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    /// Remote IP of the client (authoritative)
    pub client_ip: IpAddr,

    /// Session affinity cookie or header value presented by the client.
    pub affinity_token: Option<String>,

    /// Region code of the client, e.g. "WEU".
    pub region: Option<String>,

    /// Point of presence that received the request.
    pub pop: Option<String>,

    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,

    pub coordinates: Option<Coordinates>,

    /// Pre-evaluated rule conditions, keyed by the trimmed expression.
    pub conditions: HashMap<String, bool>,
}

impl RequestCtx {
    pub fn new(client_ip: IpAddr) -> Self {
        Self {
            client_ip,
            affinity_token: None,
            region: None,
            pop: None,
            country: None,
            coordinates: None,
            conditions: HashMap::new(),
        }
    }

    pub fn with_affinity_token(mut self, token: impl Into<String>) -> Self {
        self.affinity_token = Some(token.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_pop(mut self, pop: impl Into<String>) -> Self {
        self.pop = Some(pop.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_condition(mut self, expression: &str, holds: bool) -> Self {
        self.conditions.insert(expression.trim().to_owned(), holds);
        self
    }

    /// An empty condition always holds. An unknown condition does not.
    pub fn condition_holds(&self, expression: &str) -> bool {
        let expression = expression.trim();
        expression.is_empty() || self.conditions.get(expression).copied().unwrap_or(false)
    }

    /// Identity used by hash-based policies: the affinity token when present,
    /// the client IP otherwise.
    pub fn client_key(&self) -> ClientKey {
        match self.affinity_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => ClientKey(token.to_owned()),
            None => ClientKey(self.client_ip.to_string()),
        }
    }
}
