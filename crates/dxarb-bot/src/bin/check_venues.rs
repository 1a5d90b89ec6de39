//! One-shot venue check for operators.
//!
//! Runs one DEX search, loads the CEX catalog, quotes one symbol and, when
//! API credentials are present, reads balances. Places no orders.

use anyhow::Result;
use clap::Parser;
use dxarb_bot::{AppConfig, ChainHeadProbe};
use dxarb_cex::{ApiCredentials, CexClient, SymbolResolver};
use dxarb_core::TradingSwitch;
use dxarb_dex::DexClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Probe the DEX aggregator, the CEX and the chain RPC endpoints once
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DEX search term
    #[arg(short, long, default_value = "PEPE")]
    term: String,

    /// CEX symbol to quote (defaults to the first search hit's convention symbol)
    #[arg(short, long)]
    symbol: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dxarb_telemetry::init_logging()?;
    let args = Args::parse();

    let config_path = args
        .config
        .or_else(|| std::env::var_os("DXARB_CONFIG").map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref())?;

    // Never trade from here, whatever the config says.
    let switch = Arc::new(TradingSwitch::new(false));

    info!("=== DEX search ===");
    let dex = DexClient::new(config.dex.clone())?;
    let pairs = match dex.search_pairs(&args.term).await {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(term = %args.term, error = %e, "DEX search failed");
            Vec::new()
        }
    };
    info!(term = %args.term, count = pairs.len(), "DEX search");
    for pair in pairs.iter().take(5) {
        info!(
            pair = %pair,
            price = %pair.price_usd,
            liquidity = %pair.liquidity_usd.round_dp(0),
            "Pair"
        );
    }

    info!("=== CEX catalog ===");
    let credentials = ApiCredentials::from_env();
    let has_credentials = credentials.is_some();
    let cex = CexClient::new(config.cex.clone(), credentials, switch)?;
    match cex.fetch_symbols().await {
        Ok(symbols) => info!(count = symbols.len(), "CEX symbols"),
        Err(e) => warn!(error = %e, "CEX catalog failed"),
    }

    let resolver = SymbolResolver::new(config.cex.quote_asset.clone());
    let symbol = args.symbol.or_else(|| {
        pairs
            .first()
            .map(|p| resolver.convention_symbol(&p.base_token.symbol))
    });
    if let Some(symbol) = symbol {
        match cex.fetch_ticker(&symbol).await {
            Ok(Some(quote)) => info!(symbol = %quote.symbol, price = %quote.price, "CEX ticker"),
            Ok(None) => info!(symbol = %symbol, "Symbol not listed"),
            Err(e) => warn!(symbol = %symbol, error = %e, "CEX ticker failed"),
        }
    }

    if has_credentials {
        info!("=== CEX balances ===");
        match cex.fetch_balances().await {
            Ok(Some(balances)) => {
                for asset in balances.non_zero() {
                    info!(asset = %asset.asset, free = %asset.free, locked = %asset.locked, "Balance");
                }
            }
            Ok(None) => warn!("Balances unavailable"),
            Err(e) => warn!(error = %e, "Balance query failed"),
        }
    } else {
        info!("No API credentials, skipping balances");
    }

    info!("=== Chain heads ===");
    let probe = ChainHeadProbe::new(&config.chains)?;
    for (chain, head) in probe.refresh().await {
        info!(chain = %chain, head, "Chain head");
    }

    Ok(())
}
