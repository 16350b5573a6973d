use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use verdant_core::HealthStatus;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(about = "Offline-first field data capture for plant monitoring")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a new observation from a finished photo file
    Capture {
        /// Path to the photo payload
        #[arg(long, value_name = "PATH")]
        photo: PathBuf,

        /// Manual latitude when no GPS watcher is running
        #[arg(long, requires = "lon")]
        lat: Option<f64>,
        /// Manual longitude
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
        /// Reported fix accuracy in meters
        #[arg(long, default_value = "0")]
        accuracy: f64,

        /// Plant height in centimeters (overrides the stored default)
        #[arg(long)]
        height: Option<f64>,
        /// Species name
        #[arg(long)]
        species: Option<String>,
        /// Planting year
        #[arg(long)]
        year: Option<i32>,
        /// Job / work order label
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        supervisor: Option<String>,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        crew: Option<String>,
        #[arg(long, value_enum)]
        health: Option<HealthArg>,

        /// Treat the device as offline: save locally, skip the upload attempt
        #[arg(long)]
        offline: bool,
    },
    /// List stored observations, newest first
    List {
        /// Number of observations to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only show observations awaiting upload
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload every pending observation to the collector
    Sync {
        /// Treat the device as offline (dry guard, nothing is sent)
        #[arg(long)]
        offline: bool,
    },
    /// Merge local and remote data into one de-duplicated report
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Irreversibly delete every local observation
    Clear {
        /// Confirm the wipe; without this flag nothing is deleted
        #[arg(long)]
        yes: bool,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set the collector endpoint URL
    SetEndpoint {
        /// Collector ingest URL (http:// or https://)
        url: String,
    },
    /// Enable or disable automatic sync on reconnect
    SetAutoSync {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::value_parser!(bool))]
        enabled: bool,
    },
    /// Update the sticky capture defaults
    SetDefaults {
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        supervisor: Option<String>,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        crew: Option<String>,
        #[arg(long, value_enum)]
        health: Option<HealthArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HealthArg {
    Healthy,
    Ailing,
    Dead,
}

impl From<HealthArg> for HealthStatus {
    fn from(value: HealthArg) -> Self {
        match value {
            HealthArg::Healthy => Self::Healthy,
            HealthArg::Ailing => Self::Ailing,
            HealthArg::Dead => Self::Dead,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
