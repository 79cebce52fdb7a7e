use crate::conf::types::{EngineConfig, LoadBalancerConfig, MonitorConfig, PoolConfig};
use serde::Serialize;

/// Fully parsed configuration, ready to be lowered into a traffic snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub monitors: Vec<MonitorConfig>,
    pub pools: Vec<PoolConfig>,
    pub load_balancers: Vec<LoadBalancerConfig>,
}
