//! blockstash - operator tool for location-addressed block inventories
//!
//! Lists, inspects, moves, deletes and reloads the per-location inventory
//! records written by the server, and validates the preset and item files.

mod commands;
mod config;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::Command;
use config::{StoreConfig, DEFAULT_CONFIG_PATH};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "Block inventory storage tool", long_about = None)]
struct Cli {
    /// Path to the store configuration (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the storage root from the configuration
    #[arg(long)]
    storage_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    // WARN by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = StoreConfig::load_from_path(&cli.config);
    if let Some(root) = cli.storage_root {
        config.storage_root = root;
    }
    debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::run(&cli.command, &config, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockstash_inventory::LocationKey;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_locations_and_reload_modes() {
        let cli = Cli::parse_from(["blockstash", "move", "world;1;2;3", "world;4;5;6"]);
        assert_eq!(
            cli.command,
            Command::Move {
                from: LocationKey::new("world", 1, 2, 3),
                to: LocationKey::new("world", 4, 5, 6),
            }
        );
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));

        let cli = Cli::parse_from(["blockstash", "reload", "--all"]);
        assert_eq!(
            cli.command,
            Command::Reload {
                all: true,
                location: None
            }
        );

        assert!(Cli::try_parse_from(["blockstash", "reload"]).is_err());
        assert!(Cli::try_parse_from(["blockstash", "reload", "--all", "w;1;2;3"]).is_err());
        assert!(Cli::try_parse_from(["blockstash", "inspect", "w;1;2"]).is_err());
    }
}
