// src/main.rs
// =============================================================================
// This is the entry point of the monmon service.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the config file and set up logging
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 2 = error)
//
// The `serve` command wires everything together:
//   migrations -> stored sites -> scheduler -> HTTP API -> wait for a signal
//   -> stop the API -> stop the check loops (bounded grace period)
// =============================================================================

mod checker;
mod cli;
mod config;
mod model;
mod store;
mod watch;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use checker::HttpFetcher;
use cli::{Cli, Commands};
use config::{Config, LoggerConfig};
use model::CheckResult;
use store::{MetricsStore, PgStore, SiteRegistry};
use watch::Scheduler;
use web::AppState;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(dsn) = cli.database_url {
        config.database.pg_dsn = dsn;
    }

    init_logging(&config.logger);

    match cli.command {
        Commands::Serve => handle_serve(config).await,
        Commands::Migrate { rollback } => handle_migrate(&config, rollback).await,
        Commands::Metrics { site_id, json } => handle_metrics(&config, site_id, json).await,
    }
}

// RUST_LOG wins over the configured level
fn init_logging(logger: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logger.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logger.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// Handles the 'serve' subcommand
async fn handle_serve(config: Config) -> Result<i32> {
    let store = Arc::new(
        PgStore::connect(&config.database.pg_dsn)
            .await
            .context("cannot connect to the database")?,
    );
    store
        .run_migrations(&config.database.migrations_dir)
        .await
        .context("cannot apply database migrations")?;

    let fetcher = HttpFetcher::new(config.fetch_timeout()).context("cannot create the HTTP client")?;
    let scheduler = Arc::new(Scheduler::new(Arc::new(fetcher), store.clone()));

    // Everything registered before the restart goes back under watch at once
    let sites = store.get_sites().await.context("cannot load monitored sites")?;
    info!(count = sites.len(), "loaded monitored sites");
    scheduler.add_sites(sites);

    let app = web::build_router(AppState {
        registry: store.clone(),
        metrics: store.clone(),
        scheduler: scheduler.clone(),
    });

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot listen on {}", address))?;
    info!(address = %address, "the web server started");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("web server error")?;

    if !scheduler.shutdown(config.shutdown_grace()).await {
        warn!("exiting with check loops still running");
    }

    info!("monmon shut down");
    Ok(0)
}

// Cancels `shutdown` on SIGINT, SIGTERM or SIGHUP
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let other = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(mut terminate), Ok(mut hangup)) => {
                tokio::select! {
                    _ = terminate.recv() => {}
                    _ = hangup.recv() => {}
                }
            }
            _ => {
                error!("cannot listen for SIGTERM/SIGHUP");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let other = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = other => {}
    }

    info!("shutdown signal received");
    shutdown.cancel();
}

// Handles the 'migrate' subcommand
async fn handle_migrate(config: &Config, rollback: bool) -> Result<i32> {
    let store = PgStore::connect(&config.database.pg_dsn)
        .await
        .context("cannot connect to the database")?;
    let dir = &config.database.migrations_dir;

    if rollback {
        store.rollback_migrations(dir).await.context("cannot roll back migrations")?;
    } else {
        store.run_migrations(dir).await.context("cannot apply migrations")?;
    }

    Ok(0)
}

// Handles the 'metrics' subcommand
async fn handle_metrics(config: &Config, site_id: i64, json: bool) -> Result<i32> {
    let store = PgStore::connect(&config.database.pg_dsn)
        .await
        .context("cannot connect to the database")?;
    let metrics = store
        .get_metrics(site_id)
        .await
        .with_context(|| format!("cannot load metrics of site {}", site_id))?;

    if metrics.is_empty() && !json {
        println!("No metrics recorded for site {}", site_id);
        return Ok(0);
    }

    print_results(&metrics, json)?;
    Ok(0)
}

// Prints the results either as a table or JSON
fn print_results(results: &[CheckResult], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        print_table(results);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(results: &[CheckResult]) {
    println!("{:<27} {:<8} {:<10} {:<40}", "TIMESTAMP", "STATUS", "TIME (ms)", "CONTENT");
    println!("{}", "=".repeat(88));

    for result in results {
        println!(
            "{:<27} {:<8} {:<10} {:<40}",
            result.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            result.status_code,
            result.elapsed.as_millis(),
            format_content(result.extracted_content.as_deref()),
        );
    }

    println!();

    let ok_count = results.iter().filter(|r| r.status_code == 200).count();

    println!("📊 Summary:");
    println!("   ✅ 200 OK: {}", ok_count);
    println!("   ❌ Other status: {}", results.len() - ok_count);
    println!("   📋 Total: {}", results.len());
}

// One line of content, truncated to fit the table
fn format_content(content: Option<&str>) -> String {
    let Some(content) = content else {
        return "-".to_string();
    };

    let line = content.replace('\n', " | ");
    if line.chars().count() > 37 {
        format!("{}...", line.chars().take(37).collect::<String>())
    } else {
        line
    }
}
