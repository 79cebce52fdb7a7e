mod admin;
mod affinity;
pub mod algorithms;
mod decision;
mod director;
mod error;
mod feed;
mod geo;
mod health;
mod manager;
pub mod rules;
mod selector;
mod shedding;
mod snapshot;
pub mod steering;
mod types;

#[cfg(test)]
mod tests;

pub use admin::*;
pub use affinity::*;
pub use decision::*;
pub use director::*;
pub use error::*;
pub use feed::*;
pub use geo::*;
pub use health::*;
pub use manager::*;
pub use rules::{EffectiveConfig, RuleEngine, RuleEvaluation, RuleState};
pub use selector::*;
pub use shedding::*;
pub use snapshot::*;
pub use steering::{CandidatePools, SteeringEngine};
pub use types::*;
