use crate::cli::read_health_file;
use crate::conf::load_config;
use crate::ctx::RequestCtx;
use crate::traffic_management::{Coordinates, LoadBalancerId, TrafficManager};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Path to config directory
    #[arg(default_value = "config")]
    pub path: PathBuf,

    /// Load balancer id (or name)
    #[arg(short, long)]
    pub load_balancer: String,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub client_ip: IpAddr,

    /// Session affinity cookie or header value
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub pop: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    /// Rule condition that holds for this request (repeatable)
    #[arg(long = "condition")]
    pub conditions: Vec<String>,

    /// JSON file of health observations
    #[arg(long)]
    pub health: Option<PathBuf>,

    /// Seed for reproducible random choices
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RouteArgs {
    fn request_ctx(&self) -> RequestCtx {
        let mut req = RequestCtx::new(self.client_ip);
        req.affinity_token = self.token.clone();
        req.country = self.country.clone();
        req.pop = self.pop.clone();
        req.region = self.region.clone();
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            req.coordinates = Some(Coordinates::new(lat, lon));
        }
        self.conditions
            .iter()
            .fold(req, |req, condition| req.with_condition(condition, true))
    }
}

pub fn run(args: RouteArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.path)?;
    let manager = TrafficManager::from_config(&cfg.config);

    if let Some(path) = &args.health {
        for report in read_health_file(path)? {
            manager.report_health(report.pool, report.origin, report.region, report.observation);
        }
    }

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    debug!(event = "route_seed", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let lb = LoadBalancerId::from(args.load_balancer.as_str());
    let decision = manager.route(&lb, &args.request_ctx(), &mut rng)?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
