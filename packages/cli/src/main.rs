#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line entry point for the hotspot toolchain.
//!
//! The usual flow is `filter` (raw archives to one archive inside the
//! configured box), `build` (check-ins to interaction graph), then `serve`
//! or `query`. All paths come from `hotspot.toml` unless overridden.
//!
//! Uses `indicatif-log-bridge` (via [`hotspot_cli_utils::init_logger`]) so
//! that log lines and progress bars never fight for the terminal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::CliError;
use hotspot_config::ConfigError;
use hotspot_geography_models::Point;
use hotspot_interaction::EdgeMode;

#[derive(Parser)]
#[command(name = "hotspot", about = "Block interaction graph toolchain")]
struct Cli {
    /// Configuration file. Created with defaults if missing.
    #[arg(long, default_value = hotspot_config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at info level when `RUST_LOG` is unset
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine raw check-in archives, keeping records inside the configured box
    Filter {
        /// Directory of raw archives (overrides `[filter] directory`)
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Output archive (overrides `[filter] output`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the block interaction graph from check-ins
    Build {
        /// Check-in archives to read (defaults to `[checkins] archive`)
        #[arg(long = "archive")]
        archives: Vec<PathBuf>,
    },
    /// Print the interaction profile of the block containing a point
    Query {
        /// Latitude of the point
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,
        /// Longitude of the point
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
        /// `directed` or `undirected`
        #[arg(long, default_value = "directed")]
        edges: EdgeMode,
    },
    /// Print summary counts for the persisted graph
    Stats,
    /// Start the query server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match hotspot_config::load_or_create(&cli.config) {
        Ok(config) => config,
        Err(e @ ConfigError::Created { .. }) => {
            eprintln!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let multi = hotspot_cli_utils::init_logger(cli.verbose || config.web.debug);

    match cli.command {
        Commands::Filter { directory, output } => {
            let stats = tokio::task::spawn_blocking(move || {
                commands::filter(&config, directory, output, &multi)
            })
            .await
            .map_err(CliError::from)??;
            println!("{stats}");
        }
        Commands::Build { archives } => {
            let (stats, graph) = tokio::task::spawn_blocking(move || {
                commands::build(&config, &archives, &multi)
            })
            .await
            .map_err(CliError::from)??;
            println!(
                "users: {}\ttransitions: {}\tskipped: {}\tsources: {}\tedges: {}",
                stats.users,
                stats.transitions,
                stats.skipped,
                graph.source_count(),
                graph.edge_count()
            );
        }
        Commands::Query {
            latitude,
            longitude,
            edges,
        } => {
            let (source, blocks) =
                commands::query(&config, Point::new(longitude, latitude), edges)?;
            let output = serde_json::json!({
                "latitude": latitude,
                "longitude": longitude,
                "directed": edges.is_directed(),
                "sourceId": source,
                "blocks": blocks,
            });
            println!("{}", serde_json::to_string_pretty(&output).map_err(CliError::from)?);
        }
        Commands::Stats => {
            let graph = commands::load_graph(&config)?;
            println!("sources: {}", graph.source_count());
            println!("edges: {}", graph.edge_count());
            println!("transitions: {}", graph.total_transitions());
            println!("self transitions: {}", graph.self_transitions());
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(hotspot_server::run_server(config))
            })
            .await
            .map_err(CliError::from)?
            .map_err(CliError::from)?;
        }
    }

    Ok(())
}
