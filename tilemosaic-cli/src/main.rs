//! TileMosaic CLI - Command-line interface
//!
//! Builds square map images from slippy-map tiles and manages the tile
//! cache and configuration file.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilemosaic::config::{config_file_path, ConfigFile};
use tilemosaic::logging::{default_log_dir, init_logging};

use commands::build::BuildArgs;
use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::tile::TileArgs;
use commands::zoom::ZoomArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "tilemosaic", version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download tiles around coordinates and assemble them into a PNG
    Build(BuildArgs),

    /// Show the tile containing a coordinate
    Tile(TileArgs),

    /// Show the zoom level and tiles that would be used, without downloading
    Zoom(ZoomArgs),

    /// Manage the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let log_dir = cli.log_dir.unwrap_or_else(default_log_dir);
    let _guard = init_logging(&log_dir, cli.verbose)?;

    let config_path = cli.config.unwrap_or_else(config_file_path);

    match cli.command {
        Commands::Config { command } => commands::config::run(command, &config_path),
        Commands::Build(args) => commands::build::run(args, &ConfigFile::load_from(&config_path)?),
        Commands::Tile(args) => commands::tile::run(args, &ConfigFile::load_from(&config_path)?),
        Commands::Zoom(args) => commands::zoom::run(args, &ConfigFile::load_from(&config_path)?),
        Commands::Cache { action } => {
            commands::cache::run(action, &ConfigFile::load_from(&config_path)?)
        }
    }
}
