//! truckstop - nearby gas stations for truck drivers
//!
//! Loads the maps SDK, takes the driver's position and lists the closest
//! stations with distance and price.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::ExitCode;
use truckstop_core::config::Config;
use truckstop_core::error::exit_codes;
use truckstop_telemetry::TelemetryConfig;

mod commands;

use commands::{config, nearby};

/// Nearby gas stations for truck drivers
#[derive(Parser)]
#[command(name = "truckstop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file (defaults to .truckstop.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find gas stations around the current position
    Nearby {
        /// Latitude of the driver, overrides the configured position
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the driver, overrides the configured position
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Region the map is drawn into
        #[arg(short, long, default_value = "nearby-map")]
        region: String,

        /// Print the finder snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_code(e.exit_code());
        }
    };

    let level = if cli.verbose {
        "truckstop=debug,truckstop_maps=debug,truckstop_places=debug".to_string()
    } else {
        config.schema.logging.level.clone()
    };
    let telemetry = TelemetryConfig {
        json: config.schema.logging.json,
        ..TelemetryConfig::with_level(level)
    };
    if let Err(e) = truckstop_telemetry::init_with_config(telemetry) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let result = match cli.command {
        Commands::Nearby { lat, lng, region, json } => {
            let position = lat.zip(lng);
            nearby::run(config, position, &region, json).await
        }
        Commands::Config { json } => config::run(&config, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            let code = e
                .downcast_ref::<truckstop_core::Error>()
                .map_or(exit_codes::FAILURE, truckstop_core::Error::exit_code);
            exit_code(code)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
