//! Aggregator response shapes.
//!
//! The aggregator omits fields freely (new pools have no volume, some have
//! no USD price), so nearly everything is optional here. Conversion into
//! `MarketPair` rejects entries without an identity and maps missing
//! numbers to zero; the verifier treats a zero price as invalid data.

use crate::error::{DexError, DexResult};
use chrono::{DateTime, Utc};
use dxarb_core::{ChainId, MarketPair, Price, QuoteTokenRef, TokenRef};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// Response of `/dex/search` and `/dex/tokens/{address}`.
#[derive(Debug, Default, Deserialize)]
pub struct PairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Rolling-window figures; only the 24h bucket is used.
#[derive(Debug, Default, Deserialize)]
pub struct RawWindowed {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: String,
    #[serde(default)]
    pub base_token: RawToken,
    #[serde(default)]
    pub quote_token: RawToken,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub liquidity: Option<RawLiquidity>,
    #[serde(default)]
    pub volume: Option<RawWindowed>,
    #[serde(default)]
    pub price_change: Option<RawWindowed>,
    /// Unix milliseconds.
    #[serde(default)]
    pub pair_created_at: Option<i64>,
}

impl RawPair {
    pub fn liquidity_usd(&self) -> Decimal {
        decimal_or_zero(self.liquidity.as_ref().and_then(|l| l.usd))
    }

    /// Build a `MarketPair`. Fails only when the pair has no identity.
    pub fn into_market_pair(self) -> DexResult<MarketPair> {
        if self.pair_address.is_empty() || self.chain_id.is_empty() {
            return Err(DexError::Parse("pair without chain or address".to_string()));
        }
        if self.base_token.address.is_empty() || self.base_token.symbol.is_empty() {
            return Err(DexError::Parse(format!(
                "pair {} has no base token identity",
                self.pair_address
            )));
        }

        let liquidity_usd = self.liquidity_usd();
        let price_usd = self
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<Price>().ok())
            .unwrap_or(Price::ZERO);

        Ok(MarketPair {
            chain: ChainId::new(&self.chain_id),
            dex_id: self.dex_id,
            pair_address: self.pair_address,
            base_token: TokenRef {
                address: self.base_token.address,
                name: self.base_token.name,
                symbol: self.base_token.symbol,
            },
            quote_token: QuoteTokenRef {
                address: self.quote_token.address,
                symbol: self.quote_token.symbol,
            },
            price_usd,
            liquidity_usd,
            volume_24h_usd: decimal_or_zero(self.volume.and_then(|v| v.h24)),
            price_change_24h: decimal_or_zero(self.price_change.and_then(|v| v.h24)),
            created_at: self.pair_created_at.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}

/// Convert a response into pairs, dropping entries without identity.
pub fn parse_pairs(response: PairsResponse) -> Vec<MarketPair> {
    response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| match raw.into_market_pair() {
            Ok(pair) => Some(pair),
            Err(e) => {
                debug!(error = %e, "Skipping malformed pair");
                None
            }
        })
        .collect()
}

/// Entry of the boosted-tokens feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostedToken {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub token_address: String,
}

/// The boosted feed is a bare array; anything else yields no tokens.
pub fn parse_boosted(value: serde_json::Value) -> Vec<BoostedToken> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<BoostedToken>(item).ok())
            .filter(|t| !t.token_address.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn decimal_or_zero(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
}
