use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Pool identity (`id`, or `name` when the id is empty).
    PoolId
);

string_id!(
    /// Origin identity, unique within its pool.
    OriginId
);

string_id!(
    /// Load balancer identity (`id`, or `name` when the id is empty).
    LoadBalancerId
);

string_id!(
    /// Probing region, e.g. "WNAM" or "WEU".
    RegionCode
);

string_id!(
    /// Stable client identity used for session pins and hash policies.
    ClientKey
);
