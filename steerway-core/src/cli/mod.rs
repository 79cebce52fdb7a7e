pub mod conf;
pub mod health;
mod health_file;
pub mod route;

pub use health_file::read_health_file;
