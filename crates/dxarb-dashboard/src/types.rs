//! Response bodies.

use chrono::{DateTime, Utc};
use dxarb_core::{BotStats, Position, TradeRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub live_trading: bool,
    /// `None` until the bot has written its first statistics file.
    pub stats: Option<BotStats>,
    pub uptime: Option<String>,
    pub positions: BTreeMap<String, Position>,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradesResponse {
    pub count: usize,
    pub trades: Vec<TradeRecord>,
}
