//! Verification outcomes, trade records and run statistics.

use crate::{ChainId, ClientOrderId, OrderSide, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the pipeline should do with a verified pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Skip,
    Notify,
    Execute,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Notify => write!(f, "notify"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// One step of the admission decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Reason {
    NotListed,
    InvalidPrice,
    SpreadTooLow { spread_pct: Decimal, min_pct: Decimal },
    SpreadTooHigh { spread_pct: Decimal, max_pct: Decimal },
    LiquidityTooLow { liquidity_usd: Decimal, min_usd: Decimal },
    VolumeTooLow { volume_usd: Decimal, min_usd: Decimal },
    AllCriteriaMet,
}

impl Reason {
    /// Short stable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotListed => "not listed",
            Self::InvalidPrice => "invalid price",
            Self::SpreadTooLow { .. } => "too low",
            Self::SpreadTooHigh { .. } => "too high",
            Self::LiquidityTooLow { .. } => "liquidity too low",
            Self::VolumeTooLow { .. } => "volume too low",
            Self::AllCriteriaMet => "all criteria met",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotListed => write!(f, "Token not listed on CEX"),
            Self::InvalidPrice => write!(f, "Invalid price data"),
            Self::SpreadTooLow { spread_pct, min_pct } => {
                write!(f, "Spread too low: {:.2}% < {}%", spread_pct, min_pct)
            }
            Self::SpreadTooHigh { spread_pct, max_pct } => {
                write!(f, "Spread too high: {:.2}% > {}%", spread_pct, max_pct)
            }
            Self::LiquidityTooLow {
                liquidity_usd,
                min_usd,
            } => write!(f, "Liquidity too low: ${:.0} < ${}", liquidity_usd, min_usd),
            Self::VolumeTooLow {
                volume_usd,
                min_usd,
            } => write!(f, "Volume too low: ${:.0} < ${}", volume_usd, min_usd),
            Self::AllCriteriaMet => write!(f, "All criteria met"),
        }
    }
}

/// Result of verifying one pair against its CEX quote.
///
/// Recomputed every cycle. Stored in trade records only as a snapshot of
/// why the trade was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub admitted: bool,
    pub action: Action,
    /// Absolute divergence in percent. Never negative.
    pub spread_pct: Decimal,
    pub dex_price: Price,
    pub cex_price: Option<Price>,
    pub reasons: Vec<Reason>,
}

impl VerificationResult {
    pub fn reason_codes(&self) -> Vec<&'static str> {
        self.reasons.iter().map(Reason::code).collect()
    }

    pub fn has_reason(&self, code: &str) -> bool {
        self.reasons.iter().any(|r| r.code() == code)
    }

    /// Notify and Execute both produce a signal notification.
    pub fn should_notify(&self) -> bool {
        self.action != Action::Skip
    }

    /// Reasons joined for display.
    pub fn summary(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// An accepted order. Identity is `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Size,
    pub order_id: String,
    pub client_order_id: ClientOrderId,
    pub chain: ChainId,
    pub pair_address: String,
    pub source_signal: VerificationResult,
}

/// Net position per symbol.
///
/// Written through on every trade; nothing in the pipeline reads it back
/// for decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed: positive long, negative short.
    pub open_quantity: Decimal,
    pub trade_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            open_quantity: Decimal::ZERO,
            trade_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Apply a fill to the net quantity.
    pub fn apply_fill(&mut self, side: OrderSide, quantity: Size) {
        self.open_quantity += Decimal::from(side.sign()) * quantity.inner();
        self.trade_count += 1;
        self.updated_at = Utc::now();
    }
}

/// Process-wide counters. Reset only on restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    pub signals_processed: u64,
    pub signals_valid: u64,
    pub trades_executed: u64,
    pub errors_count: u64,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl Default for BotStats {
    fn default() -> Self {
        Self {
            signals_processed: 0,
            signals_valid: 0,
            trades_executed: 0,
            errors_count: 0,
            last_heartbeat: None,
            started_at: Utc::now(),
        }
    }
}
