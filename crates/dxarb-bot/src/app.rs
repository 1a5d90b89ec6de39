//! Application wiring.
//!
//! Builds every component from [`AppConfig`] and runs them as tasks:
//! - scan loop (foreground, owns the heartbeat timer)
//! - Telegram command loop (when Telegram is configured)
//! - status dashboard (when enabled)
//! - Ctrl-C watcher
//!
//! All of them share one `CancellationToken`; `/stop` and Ctrl-C both
//! cancel it.

use crate::chain_head::ChainHeadProbe;
use crate::commands::{CommandHandler, CommandLoop};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::notify::{DynNotifier, LogNotifier, TelegramClient, TelegramNotifier};
use crate::orchestrator::{Orchestrator, Services};
use dxarb_cex::{ApiCredentials, CexClient, DynCexApi};
use dxarb_core::TradingSwitch;
use dxarb_dashboard::DashboardState;
use dxarb_dex::DexClient;
use dxarb_persistence::{StateReader, StateStore};
use dxarb_telemetry::StatsRecorder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    orchestrator: Arc<Orchestrator>,
    telegram: Option<Arc<TelegramClient>>,
    services: Services,
    shutdown: CancellationToken,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let switch = Arc::new(TradingSwitch::new(config.bot.live_trading));
        let stats = Arc::new(StatsRecorder::new());
        let store = Arc::new(StateStore::open(&config.bot.data_dir)?);

        let credentials = ApiCredentials::from_env();
        if credentials.is_none() {
            warn!("No CEX API credentials, balance and order calls are disabled");
        }
        let cex: DynCexApi = Arc::new(CexClient::new(
            config.cex.clone(),
            credentials,
            Arc::clone(&switch),
        )?);
        let dex = Arc::new(DexClient::new(config.dex.clone())?);
        let chain_heads = Arc::new(ChainHeadProbe::new(&config.chains)?);

        let telegram = if config.telegram.enabled() {
            Some(Arc::new(TelegramClient::new(&config.telegram)?))
        } else {
            warn!("Telegram not configured, notifications go to the log");
            None
        };
        let notifier: DynNotifier = match &telegram {
            Some(client) => Arc::new(TelegramNotifier::new(Arc::clone(client))),
            None => Arc::new(LogNotifier),
        };

        let services = Services {
            source: dex,
            cex,
            notifier,
            store,
            stats,
            switch,
            chain_heads,
        };
        let orchestrator = Arc::new(Orchestrator::new(&config, services.clone()));

        Ok(Self {
            config,
            orchestrator,
            telegram,
            services,
            shutdown: CancellationToken::new(),
        })
    }

    /// Run until Ctrl-C or `/stop`.
    pub async fn run(self) -> AppResult<()> {
        info!(
            live_trading = self.services.switch.is_enabled(),
            data_dir = %self.config.bot.data_dir.display(),
            "Starting application"
        );

        let dashboard = if self.config.dashboard.enabled {
            let state = DashboardState::new(
                StateReader::new(&self.config.bot.data_dir),
                Arc::clone(&self.services.switch),
            );
            let config = self.config.dashboard.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = dxarb_dashboard::run_server(state, config).await {
                    error!(error = %e, "Dashboard server failed");
                }
            }))
        } else {
            None
        };

        let commands = self.telegram.as_ref().map(|client| {
            let handler = CommandHandler::new(
                Arc::clone(&self.services.cex),
                Arc::clone(&self.services.store),
                Arc::clone(&self.services.stats),
                Arc::clone(&self.services.switch),
                Arc::clone(&self.services.chain_heads),
                self.config.verifier.clone(),
                self.shutdown.clone(),
            );
            let command_loop = CommandLoop::new(Arc::clone(client), handler);
            tokio::spawn(command_loop.run(self.shutdown.clone()))
        });

        let ctrl_c = {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    result = tokio::signal::ctrl_c() => {
                        match result {
                            Ok(()) => info!("Shutdown signal received"),
                            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
                        }
                        shutdown.cancel();
                    }
                }
            })
        };

        let result = Arc::clone(&self.orchestrator)
            .run(self.shutdown.clone())
            .await;
        self.shutdown.cancel();

        if let Some(handle) = commands {
            if let Err(e) = handle.await {
                warn!(error = %e, "Command loop ended abnormally");
            }
        }
        if let Some(handle) = dashboard {
            handle.abort();
        }
        ctrl_c.abort();

        let stats = self.services.stats.snapshot();
        info!(
            signals_processed = stats.signals_processed,
            signals_valid = stats.signals_valid,
            trades_executed = stats.trades_executed,
            errors = stats.errors_count,
            "Shut down"
        );
        result
    }
}
