//! Shared handler state.

use crate::types::{StatusResponse, TradesResponse};
use chrono::Utc;
use dxarb_core::TradingSwitch;
use dxarb_persistence::StateReader;
use dxarb_telemetry::format_uptime;
use std::sync::Arc;

/// What the handlers can see: the state files and the live-trading flag.
#[derive(Clone)]
pub struct DashboardState {
    reader: StateReader,
    switch: Arc<TradingSwitch>,
}

impl DashboardState {
    pub fn new(reader: StateReader, switch: Arc<TradingSwitch>) -> Self {
        Self { reader, switch }
    }

    pub fn status(&self) -> StatusResponse {
        let stats = self.reader.stats();
        let now = Utc::now();
        let uptime = stats.as_ref().map(|s| {
            let elapsed = (now - s.started_at).to_std().unwrap_or_default();
            format_uptime(elapsed)
        });

        StatusResponse {
            status: "running",
            live_trading: self.switch.is_enabled(),
            stats,
            uptime,
            positions: self.reader.positions(),
            server_time: now,
        }
    }

    pub fn trades(&self, limit: usize) -> TradesResponse {
        let trades = self.reader.latest_trades(limit);
        TradesResponse {
            count: trades.len(),
            trades,
        }
    }
}
