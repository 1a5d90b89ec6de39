//! CEX market data and account types.
//!
//! These are the normalized shapes the CEX adapter hands out. Wire quirks
//! (list-or-object results, string numbers) are resolved before values of
//! these types are built.

use crate::{ClientOrderId, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the exchange instrument catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Exchange symbol, e.g. `pepe_usdt`.
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
}

/// Last traded price for a CEX symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CexQuote {
    pub symbol: String,
    pub price: Price,
    pub fetched_at: DateTime<Utc>,
}

impl CexQuote {
    pub fn new(symbol: impl Into<String>, price: Price) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            fetched_at: Utc::now(),
        }
    }
}

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub size: Size,
}

/// Order book depth snapshot. Bids descending, asks ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.first().copied()
    }

    /// Both sides have at least one level.
    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }
}

/// Balance of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// Account balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub assets: Vec<AssetBalance>,
}

impl Balances {
    /// Free balance of `asset` (case-insensitive), zero when not held.
    pub fn free_of(&self, asset: &str) -> Decimal {
        self.assets
            .iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Assets with a non-zero free balance.
    pub fn non_zero(&self) -> impl Iterator<Item = &AssetBalance> {
        self.assets.iter().filter(|b| !b.free.is_zero())
    }
}

/// Exchange acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: ClientOrderId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_book_sides() {
        let mut book = OrderBook::default();
        assert!(!book.is_two_sided());
        assert!(book.best_bid().is_none());

        book.bids.push(BookLevel {
            price: Price::new(dec!(0.97)),
            size: Size::new(dec!(1000)),
        });
        book.asks.push(BookLevel {
            price: Price::new(dec!(0.98)),
            size: Size::new(dec!(500)),
        });
        assert!(book.is_two_sided());
        assert_eq!(book.best_ask().unwrap().price, Price::new(dec!(0.98)));
    }

    #[test]
    fn test_balances_free_of() {
        let balances = Balances {
            assets: vec![
                AssetBalance {
                    asset: "usdt".to_string(),
                    free: dec!(250.5),
                    locked: dec!(0),
                },
                AssetBalance {
                    asset: "pepe".to_string(),
                    free: dec!(0),
                    locked: dec!(10),
                },
            ],
        };

        assert_eq!(balances.free_of("USDT"), dec!(250.5));
        assert_eq!(balances.free_of("BTC"), dec!(0));
        assert_eq!(balances.non_zero().count(), 1);
    }
}
