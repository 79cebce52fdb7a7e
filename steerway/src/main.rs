use clap::{Parser, Subcommand};
use steerway_core::cli;
use steerway_core::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "steerway",
    version,
    about = "Steerway: traffic-steering decision engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configuration tooling
    Conf {
        #[command(subcommand)]
        cmd: cli::conf::ConfigCmd,
    },

    /// Route one request and print the decision
    Route(cli::route::RouteArgs),

    /// Print the health report of a pool
    Health(cli::health::HealthArgs),
}

fn main() {
    let cli = Cli::parse();

    init_logging();

    let result = match cli.command {
        Command::Conf { cmd } => cli::conf::run(cmd),
        Command::Route(args) => cli::route::run(args),
        Command::Health(args) => cli::health::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
