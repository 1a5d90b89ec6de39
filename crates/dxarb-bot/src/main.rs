//! dxarb DEX/CEX spread bot - entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// DEX/CEX spread signal bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DXARB_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dxarb_telemetry::init_logging()?;

    info!("Starting dxarb v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > DXARB_CONFIG > config/default.toml if present
    let config_path = args
        .config
        .or_else(|| std::env::var_os("DXARB_CONFIG").map(PathBuf::from));
    if let Some(path) = &config_path {
        info!(config_path = %path.display(), "Loading configuration");
    }

    let config = dxarb_bot::AppConfig::load(config_path.as_deref())?;
    info!(
        live_trading = config.bot.live_trading,
        min_spread = %config.verifier.min_spread_pct,
        max_spread = %config.verifier.max_spread_pct,
        telegram = config.telegram.enabled(),
        "Configuration loaded"
    );

    let app = dxarb_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
