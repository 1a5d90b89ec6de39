//! Spread signal emitted for pairs worth reporting.

use chrono::{DateTime, Utc};
use dxarb_core::{Action, MarketPair, OrderSide, VerificationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A verified pair that should be notified, and possibly traded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadSignal {
    pub signal_id: String,
    pub pair: MarketPair,
    /// CEX symbol the quote was taken from.
    pub cex_symbol: String,
    pub result: VerificationResult,
    pub detected_at: DateTime<Utc>,
}

impl SpreadSignal {
    pub fn new(pair: MarketPair, cex_symbol: impl Into<String>, result: VerificationResult) -> Self {
        Self {
            signal_id: Uuid::new_v4().to_string(),
            pair,
            cex_symbol: cex_symbol.into(),
            result,
            detected_at: Utc::now(),
        }
    }

    pub fn is_executable(&self) -> bool {
        self.result.action == Action::Execute
    }

    /// Buy when the DEX trades below the CEX, sell otherwise. `None`
    /// without a CEX price.
    pub fn side(&self) -> Option<OrderSide> {
        self.result
            .cex_price
            .map(|cex| OrderSide::from_prices(self.result.dex_price, cex))
    }
}
