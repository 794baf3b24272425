//! gpsroute CLI - Command-line interface
//!
//! Resolves directions for waypoint lists and reorders waypoints with the
//! 2-opt optimizer.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gpsroute::logging::init_logging;

use commands::optimize::OptimizeArgs;
use commands::route::RouteArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "gpsroute")]
#[command(version = gpsroute::VERSION)]
#[command(about = "Chunked multi-provider route directions", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.gpsroute/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve directions through a list of waypoints
    Route(RouteArgs),
    /// Reorder waypoints to shorten the trip (first and last stay fixed)
    Optimize(OptimizeArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::common::load_config(cli.config.as_deref())?;

    let level = if cli.verbose { "debug" } else { "info" };
    let _logging_guard = init_logging(&config.logging.directory, &config.logging.file, level)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    match cli.command {
        Commands::Route(args) => commands::route::run(args, &config, runtime.handle()),
        Commands::Optimize(args) => commands::optimize::run(args, &config, runtime.handle()),
    }
}
