//! beacond: the Beacon daemon.
//!
//! Single binary that assembles the Beacon subsystems:
//! - Service registry (redb)
//! - Poll scheduler + HTTP prober
//! - Snapshot hub for live updates
//! - REST API
//!
//! # Usage
//!
//! ```text
//! beacond run --config /etc/beacon/beacon.toml --port 8080
//! beacond migrate --data-dir /var/lib/beacon
//! ```

mod config;
mod daemon;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::BeaconConfig;

const DEFAULT_LOG_FILTER: &str = "info,beacon=debug";

#[derive(Parser)]
#[command(name = "beacond", about = "Beacon service health daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the poller and API server.
    Run {
        /// Path to beacon.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides `server.data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Poll interval, e.g. "10s" (overrides `poller.interval`).
        #[arg(long, value_parser = duration_arg)]
        interval: Option<Duration>,

        /// Per-probe deadline, e.g. "5000ms" (overrides `poller.probe_timeout`).
        #[arg(long, value_parser = duration_arg)]
        probe_timeout: Option<Duration>,
    },

    /// Create or upgrade the state database, then exit.
    Migrate {
        /// Path to beacon.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory for persistent state (overrides `server.data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn duration_arg(s: &str) -> Result<Duration, String> {
    beacon_poller::config::parse_period(s)
        .map_err(|e| format!("{e} (expected e.g. \"10s\" or \"500ms\")"))
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run {
            config,
            port,
            data_dir,
            interval,
            probe_timeout,
        } => {
            let mut config = BeaconConfig::load(config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.server.data_dir = data_dir;
            }
            if let Some(interval) = interval {
                config.poller.interval = interval;
            }
            if let Some(probe_timeout) = probe_timeout {
                config.poller.probe_timeout = probe_timeout;
            }
            daemon::run_daemon(config).await
        }
        Command::Migrate { config, data_dir } => {
            let mut config = BeaconConfig::load(config.as_deref())?;
            if let Some(data_dir) = data_dir {
                config.server.data_dir = data_dir;
            }
            daemon::migrate(&config.server.data_dir)
        }
    }
}
