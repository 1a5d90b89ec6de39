//! Signal execution.
//!
//! # Check Order
//!
//! 1. action is not Execute     → Skipped(NotExecutable)
//! 2. live trading off          → Skipped(TradingDisabled)
//! 3. no CEX price for the side → Skipped(NoCexPrice)
//! 4. (gate permit acquired; everything below is serialized)
//! 5. symbol already claimed    → Skipped(AlreadyClaimed)
//! 6. order book absent         → Skipped(NoOrderBook), claim released
//! 7. submit market order       → Executed | Failed
//! 8. persist the trade          → Unrecorded when the store write fails
//!
//! A claim lasts for the cycle that took it. A failed submission keeps its
//! claim, so the symbol is not retried until the next cycle. An unrecorded
//! trade is live on the exchange and has to be reconciled by hand.

use crate::config::ExecutorConfig;
use chrono::Utc;
use dashmap::DashMap;
use dxarb_cex::DynCexApi;
use dxarb_core::{Action, OrderRequest, Size, TradeRecord, TradingSwitch};
use dxarb_detector::SpreadSignal;
use dxarb_persistence::StateStore;
use dxarb_telemetry::StatsRecorder;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotExecutable,
    TradingDisabled,
    NoCexPrice,
    AlreadyClaimed,
    NoOrderBook,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExecutable => write!(f, "not executable"),
            Self::TradingDisabled => write!(f, "live trading disabled"),
            Self::NoCexPrice => write!(f, "no CEX price"),
            Self::AlreadyClaimed => write!(f, "symbol already traded this cycle"),
            Self::NoOrderBook => write!(f, "order book unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Executed(TradeRecord),
    /// Accepted by the exchange but missing from the trade log.
    Unrecorded {
        record: TradeRecord,
        error: String,
    },
    Skipped(SkipReason),
    Failed(String),
}

impl ExecutionOutcome {
    /// True when an order was accepted, recorded or not.
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_) | Self::Unrecorded { .. })
    }
}

pub struct TradeExecutor {
    cex: DynCexApi,
    store: Arc<StateStore>,
    switch: Arc<TradingSwitch>,
    stats: Arc<StatsRecorder>,
    config: ExecutorConfig,
    gate: Semaphore,
    /// Symbol -> cycle that claimed it.
    claims: DashMap<String, u64>,
}

impl TradeExecutor {
    pub fn new(
        cex: DynCexApi,
        store: Arc<StateStore>,
        switch: Arc<TradingSwitch>,
        stats: Arc<StatsRecorder>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            cex,
            store,
            switch,
            stats,
            config,
            gate: Semaphore::new(1),
            claims: DashMap::new(),
        }
    }

    /// Drop claims taken by earlier cycles.
    pub fn begin_cycle(&self, cycle: u64) {
        self.claims.retain(|_, claimed| *claimed >= cycle);
    }

    pub fn is_claimed(&self, symbol: &str, cycle: u64) -> bool {
        self.claims
            .get(&symbol.to_uppercase())
            .is_some_and(|c| *c == cycle)
    }

    pub async fn execute(&self, signal: &SpreadSignal, cycle: u64) -> ExecutionOutcome {
        if signal.result.action != Action::Execute {
            return ExecutionOutcome::Skipped(SkipReason::NotExecutable);
        }
        if !self.switch.is_enabled() {
            return ExecutionOutcome::Skipped(SkipReason::TradingDisabled);
        }
        let Some(side) = signal.side() else {
            return ExecutionOutcome::Skipped(SkipReason::NoCexPrice);
        };

        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ExecutionOutcome::Failed(format!("execution gate closed: {e}")),
        };

        let symbol = signal.cex_symbol.as_str();
        let key = symbol.to_uppercase();
        if self.is_claimed(symbol, cycle) {
            debug!(symbol, cycle, "Symbol already claimed this cycle");
            return ExecutionOutcome::Skipped(SkipReason::AlreadyClaimed);
        }
        self.claims.insert(key.clone(), cycle);

        match self.cex.order_book(symbol, self.config.book_depth).await {
            Ok(Some(book)) if book.is_two_sided() => {}
            Ok(_) => {
                info!(symbol, "Order book unavailable, execution aborted");
                self.claims.remove(&key);
                return ExecutionOutcome::Skipped(SkipReason::NoOrderBook);
            }
            Err(e) => {
                warn!(symbol, error = %e, "Order book fetch failed, execution aborted");
                self.claims.remove(&key);
                return ExecutionOutcome::Skipped(SkipReason::NoOrderBook);
            }
        }

        let quantity = Size::new(self.config.order_quantity);
        let request = OrderRequest::market(symbol, side, quantity);

        let ack = match self.cex.place_order(&request).await {
            Ok(Some(ack)) => ack,
            Ok(None) => {
                self.claims.remove(&key);
                return ExecutionOutcome::Skipped(SkipReason::TradingDisabled);
            }
            Err(e) => {
                error!(symbol, %side, error = %e, "Order submission failed");
                self.stats.record_error("execution");
                return ExecutionOutcome::Failed(e.to_string());
            }
        };

        let record = TradeRecord {
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            side,
            quantity,
            order_id: ack.order_id,
            client_order_id: ack.client_order_id,
            chain: signal.pair.chain.clone(),
            pair_address: signal.pair.pair_address.clone(),
            source_signal: signal.result.clone(),
        };

        self.stats.record_trade(&side.to_string());
        if let Err(e) = self.store.append_trade(record.clone()) {
            error!(
                symbol,
                %side,
                order_id = %record.order_id,
                error = %e,
                "Order accepted but trade not persisted"
            );
            self.stats.record_error("persistence");
            return ExecutionOutcome::Unrecorded {
                record,
                error: e.to_string(),
            };
        }

        info!(
            symbol,
            %side,
            quantity = %quantity,
            order_id = %record.order_id,
            spread = %signal.result.spread_pct.round_dp(2),
            "Trade executed"
        );
        ExecutionOutcome::Executed(record)
    }
}
