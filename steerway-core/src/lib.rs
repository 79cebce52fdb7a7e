pub mod cli;
pub mod conf;
pub mod ctx;
pub mod logging;
pub mod traffic_management;
