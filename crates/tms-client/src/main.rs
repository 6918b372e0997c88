//! TMS demonstration client entry point.
//!
//! Runs the trading flow against the in-process simulated service; the
//! remote transport is an external collaborator and plugs in behind
//! `TradingService`.

use anyhow::Result;
use clap::Parser;
use tms_client::{AppConfig, Application};
use tms_sim::SimulatedTms;
use tracing::info;

/// TMS remote trading client demo
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TMS_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tms_client::logging::init_logging();

    info!("Starting TMS client v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > TMS_CONFIG env var > default.
    let config_path = args
        .config
        .or_else(|| std::env::var("TMS_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::load_or_default(&config_path)?;
    info!(
        targets = config.targets.len(),
        wave_size_pct = config.wave_size_pct,
        "Configuration loaded"
    );

    let service = SimulatedTms::new(config.simulator.clone());

    let app = Application::new(config, service);
    app.run().await?;

    info!("Client finished");
    Ok(())
}
