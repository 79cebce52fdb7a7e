mod entrypoint;
mod load_balancer;
mod monitor;
mod pool;
mod rule;
mod runtime_config;

pub use entrypoint::*;
pub use load_balancer::*;
pub use monitor::*;
pub use pool::*;
pub use rule::*;
pub use runtime_config::*;

use serde::{Deserialize, Deserializer};

/// API objects send `null` for empty lists and maps.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
