mod config;
pub mod events;

pub use config::ConfigDir;
pub use events::{CapturedEvent, CapturedEvents, init_test_tracing};
