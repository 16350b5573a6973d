//! Verdant CLI - offline-first field data capture for plant monitoring
//!
//! Capture observations in the field, sync them to the collector whenever
//! connectivity allows.

use std::env;
use std::path::PathBuf;

use clap::Parser;

mod cli;
mod commands;
mod error;


use cli::{Cli, Commands};
use commands::capture::{run_capture, CaptureArgs};
use commands::clear::run_clear;
use commands::completions::run_completions;
use commands::config::run_config;
use commands::list::run_list;
use commands::report::run_report;
use commands::sync::run_sync;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(default_env_filter())
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Capture {
            photo,
            lat,
            lon,
            accuracy,
            height,
            species,
            year,
            job,
            supervisor,
            vendor,
            crew,
            health,
            offline,
        } => {
            run_capture(
                CaptureArgs {
                    photo: &photo,
                    lat,
                    lon,
                    accuracy,
                    height,
                    species,
                    year,
                    job,
                    supervisor,
                    vendor,
                    crew,
                    health,
                    offline,
                },
                &db_path,
            )
            .await?;
        }
        Commands::List {
            limit,
            pending,
            json,
        } => run_list(limit, pending, json, &db_path).await?,
        Commands::Sync { offline } => run_sync(offline, &db_path).await?,
        Commands::Report { json } => run_report(json, &db_path).await?,
        Commands::Clear { yes } => run_clear(yes, &db_path).await?,
        Commands::Config { action } => run_config(action, &db_path).await?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}

fn default_env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("verdant_core=info".parse().unwrap())
        .add_directive("verdant_cli=info".parse().unwrap())
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("VERDANT_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("verdant")
        .join("verdant.db")
}
