//! Exchange wire formats.
//!
//! Responses share an envelope `{rc, mc, result}`. Several endpoints return
//! `result` either as a single object or as a list, and numbers arrive as
//! strings. Everything here is normalized into `dxarb_core` types before it
//! leaves the crate.

use crate::error::{CexError, CexResult};
use dxarb_core::{
    AssetBalance, Balances, BookLevel, CexQuote, OrderBook, OrderRequest, OrderType, Price, Size,
    SymbolInfo,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub rc: i64,
    #[serde(default)]
    pub mc: Option<String>,
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// `rc != 0` is a protocol error even on HTTP 200.
    pub fn into_result(self) -> CexResult<Option<T>> {
        if self.rc != 0 {
            return Err(CexError::Api {
                code: self.rc,
                message: self.mc.unwrap_or_default(),
            });
        }
        Ok(self.result)
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTicker {
    #[serde(rename = "s", alias = "symbol", default)]
    pub symbol: String,
    /// String on the wire; some gateways send a bare number.
    #[serde(rename = "p", alias = "price", default)]
    pub price: Option<Value>,
    #[serde(rename = "t", alias = "time", default)]
    pub time: Option<i64>,
}

/// Normalize a raw ticker `result` for `symbol`.
///
/// An object is the ticker itself. A list with one element is that element;
/// a longer list must contain the requested symbol. Any other shape, an
/// empty result and a missing or unparsable price are absent, never zero.
pub fn normalize_ticker(symbol: &str, result: Option<Value>) -> Option<CexQuote> {
    let ticker: RawTicker = match result? {
        object @ Value::Object(_) => serde_json::from_value(object).ok()?,
        Value::Array(mut list) if list.len() == 1 => serde_json::from_value(list.pop()?).ok()?,
        Value::Array(list) => list
            .into_iter()
            .filter_map(|item| serde_json::from_value::<RawTicker>(item).ok())
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))?,
        _ => return None,
    };
    let price = match ticker.price? {
        Value::String(s) => Price::from_str(&s).ok()?,
        Value::Number(n) => Price::from_str(&n.to_string()).ok()?,
        _ => return None,
    };
    Some(CexQuote::new(symbol, price))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSymbol {
    #[serde(default)]
    pub symbol: String,
    #[serde(alias = "baseCurrency", default)]
    pub base_asset: String,
    #[serde(alias = "quoteCurrency", default)]
    pub quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SymbolsResult {
    List(Vec<RawSymbol>),
    Wrapped { symbols: Vec<RawSymbol> },
}

pub fn normalize_symbols(result: Option<SymbolsResult>) -> Vec<SymbolInfo> {
    let raw = match result {
        Some(SymbolsResult::List(list)) | Some(SymbolsResult::Wrapped { symbols: list }) => list,
        None => return Vec::new(),
    };
    raw.into_iter()
        .filter(|s| !s.symbol.is_empty())
        .map(|s| SymbolInfo {
            symbol: s.symbol,
            base_asset: s.base_asset,
            quote_asset: s.quote_asset,
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct RawDepth {
    #[serde(default)]
    pub bids: Vec<(String, String)>,
    #[serde(default)]
    pub asks: Vec<(String, String)>,
}

fn levels(raw: Vec<(String, String)>) -> Vec<BookLevel> {
    raw.into_iter()
        .filter_map(|(p, q)| {
            Some(BookLevel {
                price: Price::from_str(&p).ok()?,
                size: Size::from_str(&q).ok()?,
            })
        })
        .collect()
}

/// A book with no usable level on either side is absent.
pub fn normalize_depth(result: Option<RawDepth>) -> Option<OrderBook> {
    let raw = result?;
    let book = OrderBook {
        bids: levels(raw.bids),
        asks: levels(raw.asks),
    };
    if book.bids.is_empty() && book.asks.is_empty() {
        return None;
    }
    Some(book)
}

#[derive(Debug, Deserialize)]
pub struct RawBalances {
    #[serde(default)]
    pub assets: Vec<RawAsset>,
}

#[derive(Debug, Deserialize)]
pub struct RawAsset {
    #[serde(alias = "currency", default)]
    pub asset: String,
    #[serde(alias = "availableAmount", default)]
    pub free: Option<String>,
    #[serde(alias = "frozenAmount", default)]
    pub locked: Option<String>,
}

fn amount(raw: Option<String>) -> Decimal {
    raw.and_then(|s| Decimal::from_str(s.trim()).ok())
        .unwrap_or(Decimal::ZERO)
}

pub fn normalize_balances(result: Option<RawBalances>) -> Balances {
    let assets = result
        .map(|r| r.assets)
        .unwrap_or_default()
        .into_iter()
        .filter(|a| !a.asset.is_empty())
        .map(|a| AssetBalance {
            asset: a.asset.to_uppercase(),
            free: amount(a.free),
            locked: amount(a.locked),
        })
        .collect();
    Balances { assets }
}

#[derive(Debug, Deserialize)]
pub struct RawOrderResult {
    #[serde(rename = "orderId", default)]
    pub order_id: Value,
}

impl RawOrderResult {
    /// Order ids come back as strings or numbers.
    pub fn order_id(&self) -> Option<String> {
        match &self.order_id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Unsigned parameter set for an order submission.
pub fn order_params(request: &OrderRequest) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("symbol".to_string(), request.symbol.clone());
    params.insert("side".to_string(), request.side.as_wire().to_string());
    params.insert("type".to_string(), request.order_type.as_wire().to_string());
    params.insert("quantity".to_string(), request.quantity.to_string());
    params.insert(
        "clientOrderId".to_string(),
        request.client_order_id.as_str().to_string(),
    );
    if request.order_type == OrderType::Limit {
        if let Some(price) = request.price {
            params.insert("price".to_string(), price.to_string());
        }
        let tif = request.time_in_force.unwrap_or_default();
        params.insert("timeInForce".to_string(), tif.as_wire().to_string());
    }
    params
}
