//! Scan → verify → notify → execute cycle.
//!
//! # Cycle
//!
//! ```text
//! Idle → Scanning → Verifying → Notifying → Executing → Idle
//!                                              ↓ (stop token)
//!                                           Stopped
//! ```
//!
//! - Scanning: candidate pairs, or the watchlist when the scan is empty;
//!   deduplicated by pair address.
//! - Verifying: `batch_size` pairs at a time, concurrently within a batch,
//!   with `batch_pause` between batches. One pair failing never cancels its
//!   siblings.
//! - Notifying: at most one signal notification per pair address per cycle;
//!   every notified signal is journaled.
//! - Executing: Execute results go through [`TradeExecutor`], which allows
//!   one order per symbol per cycle.
//!
//! The heartbeat runs on its own timer, independent of the scan cadence.
//! The stop token is checked between cycles only.

use crate::chain_head::ChainHeadProbe;
use crate::config::{AppConfig, BotConfig};
use crate::error::AppResult;
use crate::notify::{DynNotifier, HeartbeatSummary, Notification};
use dxarb_cex::{DynCexApi, SymbolCatalog, SymbolResolver};
use dxarb_core::{Action, MarketPair, SymbolInfo, TradingSwitch, VerificationResult};
use dxarb_detector::{SpreadSignal, SpreadVerifier};
use dxarb_dex::{DynPairSource, PairSet};
use dxarb_executor::{ExecutionOutcome, TradeExecutor};
use dxarb_persistence::{SignalJournal, StateStore};
use dxarb_telemetry::{format_uptime, Metrics, StatsRecorder};
use futures_util::future::join_all;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Verifying,
    Notifying,
    Executing,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Verifying => write!(f, "verifying"),
            Self::Notifying => write!(f, "notifying"),
            Self::Executing => write!(f, "executing"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of verifying one pair.
#[derive(Debug, Clone)]
pub enum PairOutcome {
    Verified {
        pair: MarketPair,
        /// CEX symbol the quote was requested for, if one was resolved.
        symbol: Option<String>,
        result: VerificationResult,
    },
    Failed {
        pair_address: String,
        error: String,
    },
}

/// Counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub pairs: usize,
    pub verified: usize,
    pub failed: usize,
    pub notified: usize,
    pub executed: usize,
}

/// Shared handles the orchestrator is built from.
#[derive(Clone)]
pub struct Services {
    pub source: DynPairSource,
    pub cex: DynCexApi,
    pub notifier: DynNotifier,
    pub store: Arc<StateStore>,
    pub stats: Arc<StatsRecorder>,
    pub switch: Arc<TradingSwitch>,
    pub chain_heads: Arc<ChainHeadProbe>,
}

pub struct Orchestrator {
    config: BotConfig,
    source: DynPairSource,
    cex: DynCexApi,
    catalog: SymbolCatalog,
    resolver: SymbolResolver,
    verifier: SpreadVerifier,
    executor: TradeExecutor,
    notifier: DynNotifier,
    store: Arc<StateStore>,
    stats: Arc<StatsRecorder>,
    switch: Arc<TradingSwitch>,
    chain_heads: Arc<ChainHeadProbe>,
    journal: Mutex<SignalJournal>,
    phase: Mutex<Phase>,
    cycle: AtomicU64,
}

impl Orchestrator {
    pub fn new(config: &AppConfig, services: Services) -> Self {
        let executor = TradeExecutor::new(
            Arc::clone(&services.cex),
            Arc::clone(&services.store),
            Arc::clone(&services.switch),
            Arc::clone(&services.stats),
            config.executor.clone(),
        );
        let journal = SignalJournal::new(
            config.bot.data_dir.join("signals"),
            config.bot.journal_buffer,
        );

        Self {
            config: config.bot.clone(),
            source: services.source,
            catalog: SymbolCatalog::new(Arc::clone(&services.cex), config.cex.catalog_ttl()),
            cex: services.cex,
            resolver: SymbolResolver::new(config.cex.quote_asset.clone()),
            verifier: SpreadVerifier::new(config.verifier.clone()),
            executor,
            notifier: services.notifier,
            store: services.store,
            stats: services.stats,
            switch: services.switch,
            chain_heads: services.chain_heads,
            journal: Mutex::new(journal),
            phase: Mutex::new(Phase::Idle),
            cycle: AtomicU64::new(0),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycle.load(Ordering::SeqCst)
    }

    fn set_phase(&self, phase: Phase) {
        let mut current = self.phase.lock();
        if *current != phase {
            debug!(from = %*current, to = %phase, "Phase change");
            *current = phase;
        }
    }

    /// Run cycles until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> AppResult<()> {
        info!(
            live_trading = self.switch.is_enabled(),
            scan_interval_secs = self.config.scan_interval_secs,
            batch_size = self.config.batch_size,
            "Starting scan loop"
        );
        Metrics::live_trading(self.switch.is_enabled());
        self.notify(&Notification::Startup {
            live_trading: self.switch.is_enabled(),
            min_spread_pct: self.verifier.config().min_spread_pct,
            max_spread_pct: self.verifier.config().max_spread_pct,
        })
        .await;

        let heartbeat = tokio::spawn(Arc::clone(&self).heartbeat_loop(shutdown.clone()));

        while !shutdown.is_cancelled() {
            let pause = match self.run_cycle().await {
                Ok(report) => {
                    debug!(?report, "Cycle complete");
                    self.config.scan_interval()
                }
                Err(e) => {
                    error!(error = %e, "Scan cycle failed");
                    self.set_phase(Phase::Idle);
                    self.stats.record_error("cycle");
                    self.notify(&Notification::Error {
                        context: "scan cycle".to_string(),
                        message: e.to_string(),
                    })
                    .await;
                    self.config.error_cooldown()
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(cycles = self.cycles(), "Stop requested, shutting down scan loop");
        self.set_phase(Phase::Stopped);
        if let Err(e) = heartbeat.await {
            warn!(error = %e, "Heartbeat task ended abnormally");
        }

        if let Err(e) = self.journal.lock().close() {
            warn!(error = %e, "Failed to close signal journal");
        }
        let stats = self.stats.snapshot();
        if let Err(e) = self.store.save_stats(&stats) {
            warn!(error = %e, "Failed to save final stats");
        }
        self.notify(&Notification::Shutdown { stats }).await;
        Ok(())
    }

    /// One full cycle.
    pub async fn run_cycle(&self) -> AppResult<CycleReport> {
        let started = Instant::now();
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };

        self.set_phase(Phase::Scanning);
        let pairs = self.scan().await;
        report.pairs = pairs.len();
        if pairs.is_empty() {
            info!(cycle, "No pairs to verify");
            self.set_phase(Phase::Idle);
            return Ok(report);
        }

        self.set_phase(Phase::Verifying);
        let outcomes = self.verify_all(pairs).await;

        self.set_phase(Phase::Notifying);
        let mut notified: HashSet<String> = HashSet::new();
        let mut executable = Vec::new();
        for outcome in outcomes {
            let (pair, symbol, result) = match outcome {
                PairOutcome::Verified {
                    pair,
                    symbol,
                    result,
                } => (pair, symbol, result),
                PairOutcome::Failed {
                    pair_address,
                    error,
                } => {
                    report.failed += 1;
                    debug!(pair = %pair_address, error = %error, "Pair verification failed");
                    continue;
                }
            };
            report.verified += 1;

            if !result.should_notify() || !notified.insert(pair.dedup_key()) {
                continue;
            }
            let signal = SpreadSignal::new(pair, symbol.unwrap_or_default(), result);
            info!(
                signal_id = %signal.signal_id,
                pair = %signal.pair,
                symbol = %signal.cex_symbol,
                spread = %signal.result.spread_pct.round_dp(2),
                action = %signal.result.action,
                "Spread signal"
            );
            self.journal.lock().record(&signal)?;
            self.notify(&Notification::Signal(Box::new(signal.clone())))
                .await;
            report.notified += 1;

            if signal.is_executable() {
                executable.push(signal);
            }
        }
        self.journal.lock().flush()?;

        if !executable.is_empty() {
            self.set_phase(Phase::Executing);
            self.executor.begin_cycle(cycle);
            for signal in &executable {
                match self.executor.execute(signal, cycle).await {
                    ExecutionOutcome::Executed(record) => {
                        report.executed += 1;
                        self.notify(&Notification::Trade(Box::new(record))).await;
                    }
                    ExecutionOutcome::Unrecorded { record, error } => {
                        report.executed += 1;
                        let message = format!(
                            "order {} ({} {} {}) is live but missing from the trade log: {}",
                            record.order_id, record.side, record.quantity, record.symbol, error
                        );
                        self.notify(&Notification::Trade(Box::new(record))).await;
                        self.notify(&Notification::Error {
                            context: "trade log".to_string(),
                            message,
                        })
                        .await;
                    }
                    ExecutionOutcome::Failed(message) => {
                        self.notify(&Notification::Error {
                            context: format!("order {}", signal.cex_symbol),
                            message,
                        })
                        .await;
                    }
                    ExecutionOutcome::Skipped(reason) => {
                        debug!(symbol = %signal.cex_symbol, %reason, "Execution skipped");
                    }
                }
            }
        }

        if let Err(e) = self.store.save_stats(&self.stats.snapshot()) {
            warn!(error = %e, "Failed to save stats");
        }

        let elapsed = started.elapsed();
        Metrics::cycle_duration(elapsed.as_secs_f64() * 1000.0);
        info!(
            cycle,
            pairs = report.pairs,
            verified = report.verified,
            failed = report.failed,
            notified = report.notified,
            executed = report.executed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Cycle finished"
        );
        self.set_phase(Phase::Idle);
        Ok(report)
    }

    async fn scan(&self) -> Vec<MarketPair> {
        let mut pairs = self
            .source
            .candidate_pairs(self.config.concurrent_fetch)
            .await;
        let mut source = "candidates";
        if pairs.is_empty() {
            info!("Candidate scan empty, falling back to watchlist");
            pairs = self.source.watchlist_pairs().await;
            source = "watchlist";
        }

        let total = pairs.len();
        let pairs = pairs.into_iter().collect::<PairSet>().into_capped(usize::MAX);
        if pairs.len() < total {
            debug!(dropped = total - pairs.len(), "Duplicate pairs dropped");
        }
        Metrics::pairs_scanned(source, pairs.len());
        pairs
    }

    async fn verify_all(&self, pairs: Vec<MarketPair>) -> Vec<PairOutcome> {
        let catalog = self.catalog.get().await;
        let batch_size = self.config.batch_size.max(1);

        let mut outcomes = Vec::with_capacity(pairs.len());
        for (idx, batch) in pairs.chunks(batch_size).enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.config.batch_pause()).await;
            }
            let results = join_all(
                batch
                    .iter()
                    .map(|pair| self.verify_pair(pair.clone(), catalog.as_slice())),
            )
            .await;
            outcomes.extend(results);
        }
        outcomes
    }

    /// Resolve, quote and verify one pair.
    pub async fn verify_pair(&self, pair: MarketPair, catalog: &[SymbolInfo]) -> PairOutcome {
        self.stats.record_processed();

        let resolved = self.resolver.resolve(
            &pair.chain,
            &pair.base_token.address,
            &pair.base_token.symbol,
            catalog,
        );

        let quote = match &resolved {
            Some(resolved) => match self.cex.ticker(&resolved.symbol).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(pair = %pair, symbol = %resolved.symbol, error = %e, "Ticker fetch failed");
                    self.stats.record_error("ticker");
                    return PairOutcome::Failed {
                        pair_address: pair.pair_address,
                        error: e.to_string(),
                    };
                }
            },
            None => None,
        };

        let result = self
            .verifier
            .verify(&pair, quote.as_ref(), self.switch.is_enabled());
        Metrics::verification(&result.action.to_string());
        if quote.is_some() {
            if let Some(spread) = result.spread_pct.to_f64() {
                Metrics::spread_observed(pair.chain.as_str(), spread);
            }
        }
        if result.admitted {
            self.stats.record_valid();
        }
        if result.action != Action::Skip {
            debug!(pair = %pair, spread = %result.spread_pct.round_dp(2), action = %result.action, "Verified");
        }

        PairOutcome::Verified {
            pair,
            symbol: resolved.map(|r| r.symbol),
            result,
        }
    }

    async fn heartbeat_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.send_heartbeat().await;
                }
            }
        }
    }

    /// Probe chain heads, stamp and persist stats, and notify.
    pub async fn send_heartbeat(&self) -> HeartbeatSummary {
        let chain_heads = self.chain_heads.refresh().await;
        let stats = self.stats.mark_heartbeat();
        if let Err(e) = self.store.save_stats(&stats) {
            warn!(error = %e, "Failed to save stats");
        }

        let summary = HeartbeatSummary {
            uptime: format_uptime(self.stats.uptime()),
            stats,
            chain_heads,
            live_trading: self.switch.is_enabled(),
        };
        info!(
            uptime = %summary.uptime,
            signals = summary.stats.signals_processed,
            trades = summary.stats.trades_executed,
            phase = %self.phase(),
            "Heartbeat"
        );
        self.notify(&Notification::Heartbeat(summary.clone())).await;
        summary
    }

    async fn notify(&self, notification: &Notification) {
        if !self.notifier.send(notification).await {
            debug!(kind = notification.kind(), "Notification not delivered");
        }
    }
}
