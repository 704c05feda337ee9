use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::config;
use crate::http::server::HttpServer;
use crate::storage::bootstrap::{self, SchemaInit};
use crate::storage::error::StorageError;
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "tracklist")]
#[command(version = "0.1")]
#[command(about = "REST service for a library of music tracks")]
pub struct Cli {
    /// Path to an optional config TOML file. PORT, DB_NAME and DB_PATH override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server exposing /api/tracks
    Serve,
    /// Create the tracks table if it does not exist
    InitDb {
        /// Drop the existing table first. Every stored track is deleted.
        #[arg(long)]
        force: bool,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::Config::resolve(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve => serve(cfg),

        Commands::InitDb { force } => {
            let mode = if *force {
                SchemaInit::Recreate
            } else {
                SchemaInit::IfMissing
            };
            bootstrap::initialize_schema(&cfg.database, mode).with_context(|| {
                format!(
                    "Error setting up database {}",
                    cfg.database.path.to_string_lossy()
                )
            })
        }
    }
}

fn connect_storage(db_config: &config::Database) -> Result<Storage, StorageError> {
    let storage = Storage::new(db_config)?;
    storage.ping()?;
    Ok(storage)
}

/// Refuses to listen unless the database answers
fn serve(cfg: config::Config) -> anyhow::Result<()> {
    let storage = connect_storage(&cfg.database).with_context(|| {
        format!(
            "Failed to start server: could not connect to database {}",
            cfg.database.path.to_string_lossy()
        )
    })?;
    info!("API connected to database");

    HttpServer::new(storage, cfg.http).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["tracklist", "serve"]).unwrap();

        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn test_parse_init_db_defaults_to_non_destructive() {
        let cli = Cli::try_parse_from(["tracklist", "init-db"]).unwrap();

        assert!(matches!(cli.command, Commands::InitDb { force: false }));
    }

    #[test]
    fn test_parse_init_db_force_with_config() {
        let cli =
            Cli::try_parse_from(["tracklist", "--config", "tracklist.toml", "init-db", "--force"])
                .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("tracklist.toml")));
        assert!(matches!(cli.command, Commands::InitDb { force: true }));
    }

    #[test]
    fn test_serve_fails_when_database_unreachable() {
        let mut cfg = config::Config::default();
        cfg.database.path = PathBuf::from("/nonexistent/dir/tracks.db");

        assert!(serve(cfg).is_err());
    }

    #[test]
    fn test_clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
