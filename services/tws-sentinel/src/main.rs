//! TWS Sentinel CLI
//!
//! Command-line interface for the TWS API liveness monitor.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tws_sentinel::{load_config, Config, SentinelBuilder};

#[derive(Parser)]
#[command(name = "tws-sentinel")]
#[command(about = "Interactive Brokers TWS API liveness monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TWS / IB Gateway host (overrides config file and environment)
    #[arg(long)]
    tws_host: Option<String>,

    /// TWS / IB Gateway API port (overrides config file and environment)
    #[arg(long)]
    tws_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, tws_host={:?}, tws_port={:?}, log_level={:?}",
        args.config,
        args.tws_host,
        args.tws_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;

    if let Some(host) = args.tws_host {
        config.gateway.host = host;
    }
    if let Some(port) = args.tws_port {
        config.gateway.port = port;
    }

    tracing::debug!(
        "Gateway: {}, label: {}, poll interval: {:?}, reminder interval: {:?}",
        config.gateway.address(),
        config.label,
        config.poll_interval,
        config.reminder_interval
    );

    let sentinel = match SentinelBuilder::new(config).build() {
        Ok(sentinel) => sentinel,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    let state = sentinel.start().await?;
    tracing::info!("Stopped with gateway status {}", state.status());

    Ok(())
}
