use crate::traffic_management::{LoadBalancerId, PoolId};

/// Configuration problems found while routing. These abort the evaluation of
/// one request; an unroutable request is a `Decision::Failed` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrafficError {
    #[error("unknown load balancer '{0}'")]
    UnknownLoadBalancer(LoadBalancerId),

    #[error("load balancer '{load_balancer}' references unknown pool '{pool}'")]
    UnknownPool {
        load_balancer: LoadBalancerId,
        pool: PoolId,
    },

    #[error("rule '{rule}' of load balancer '{load_balancer}' has an invalid override: {reason}")]
    InvalidOverride {
        load_balancer: LoadBalancerId,
        rule: String,
        reason: String,
    },
}
