// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Global options pick the config file and can override the database
// connection string; the subcommand picks what to do:
//   serve    run the monitoring service
//   migrate  apply (or roll back) database migrations
//   metrics  print the stored metrics of one site
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "monmon",
    version,
    about = "Polls registered websites and records status, timing and matched content",
    long_about = "monmon checks every registered URL on its own interval, extracts the parts of \
                  the page that match a regular expression, and stores the results in Postgres. \
                  New sites are registered through a small HTTP API."
)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, short, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Postgres connection string (overrides database.pg_dsn)
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitoring service and its registration API
    ///
    /// Example: monmon serve --config config.toml
    Serve,

    /// Apply database migrations and exit
    ///
    /// Example: monmon migrate --rollback
    Migrate {
        /// Revert all applied migrations instead
        #[arg(long)]
        rollback: bool,
    },

    /// Print the metrics recorded for a site
    ///
    /// Example: monmon metrics 3 --json
    Metrics {
        /// Id of the monitored site
        site_id: i64,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_defaults() {
        let cli = Cli::try_parse_from(["monmon", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_parse_metrics() {
        let cli = Cli::try_parse_from(["monmon", "metrics", "3", "--json", "-c", "other.toml"]).unwrap();
        match cli.command {
            Commands::Metrics { site_id, json } => {
                assert_eq!(site_id, 3);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn test_parse_migrate_rollback() {
        let cli = Cli::try_parse_from(["monmon", "migrate", "--rollback"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate { rollback: true }));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["monmon"]).is_err());
    }
}
