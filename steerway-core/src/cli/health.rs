use crate::cli::read_health_file;
use crate::conf::load_config;
use crate::traffic_management::TrafficManager;
use anyhow::anyhow;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Path to config directory
    #[arg(default_value = "config")]
    pub path: PathBuf,

    /// Pool id (or name)
    #[arg(long)]
    pub pool: String,

    /// JSON file of health observations
    #[arg(long)]
    pub health: Option<PathBuf>,
}

/// Print the health report of one pool.
pub fn run(args: HealthArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.path)?;
    let manager = TrafficManager::from_config(&cfg.config);

    if let Some(path) = &args.health {
        for report in read_health_file(path)? {
            manager.report_health(report.pool, report.origin, report.region, report.observation);
        }
    }

    let view = manager
        .pool_health(&args.pool)
        .ok_or_else(|| anyhow!("unknown pool '{}'", args.pool))?;

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
