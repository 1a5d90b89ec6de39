//! DEX market identification types.
//!
//! A `MarketPair` is one pool on one chain as reported by the DEX
//! aggregator. Pairs are immutable snapshots rebuilt every scan.

use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain identifier as used by the aggregator (`ethereum`, `bsc`, `solana`, ...).
///
/// Always stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the chain speaks the Ethereum JSON-RPC dialect.
    pub fn is_evm(&self) -> bool {
        !matches!(self.0.as_str(), "solana" | "ton" | "sui" | "tron")
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ChainId> for String {
    fn from(c: ChainId) -> Self {
        c.0
    }
}

/// Base token of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// Quote token of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTokenRef {
    pub address: String,
    pub symbol: String,
}

/// Snapshot of one DEX pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPair {
    pub chain: ChainId,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: TokenRef,
    pub quote_token: QuoteTokenRef,
    pub price_usd: Price,
    pub liquidity_usd: Decimal,
    pub volume_24h_usd: Decimal,
    pub price_change_24h: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

impl MarketPair {
    /// Key used to deduplicate pairs across queries.
    ///
    /// EVM addresses arrive in mixed checksum case, so the key is lowercased.
    pub fn dedup_key(&self) -> String {
        self.pair_address.to_ascii_lowercase()
    }

    /// Short human label, e.g. `PEPE/WETH`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.base_token.symbol, self.quote_token.symbol)
    }
}

impl fmt::Display for MarketPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} ({})", self.label(), self.chain, self.dex_id)
    }
}

/// Fixed watchlist entry used when the candidate scan comes back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchToken {
    pub chain: ChainId,
    pub address: String,
    pub symbol: String,
}

impl WatchToken {
    pub fn new(chain: impl Into<ChainId>, address: &str, symbol: &str) -> Self {
        Self {
            chain: chain.into(),
            address: address.to_string(),
            symbol: symbol.to_string(),
        }
    }
}
