//! Core domain types for the dxarb spread bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `MarketPair`, `ChainId`: DEX pair snapshots and chain identity
//! - `CexQuote`, `OrderBook`, `SymbolInfo`: CEX market data
//! - `VerificationResult`, `TradeRecord`, `BotStats`: pipeline outputs
//! - `TradingSwitch`: the global live-trading kill switch
//! - `retry`: bounded retry wrapper shared by the venue adapters

pub mod decimal;
pub mod execution;
pub mod market;
pub mod order;
pub mod retry;
pub mod switch;
pub mod types;

pub use decimal::{Price, Size};
pub use execution::{Action, BotStats, Position, Reason, TradeRecord, VerificationResult};
pub use market::{ChainId, MarketPair, QuoteTokenRef, TokenRef, WatchToken};
pub use order::{ClientOrderId, OrderRequest, OrderSide, OrderType, TimeInForce};
pub use retry::{with_retry, RetryError, RetryPolicy, Transient};
pub use switch::TradingSwitch;
pub use types::{AssetBalance, Balances, BookLevel, CexQuote, OrderAck, OrderBook, SymbolInfo};

use std::future::Future;
use std::pin::Pin;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
