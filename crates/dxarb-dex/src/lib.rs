//! DEX aggregator adapter for dxarb.
//!
//! Fetches candidate pairs from a DexScreener-compatible API:
//! - `DexClient`: HTTP client with throttling and bounded retry
//! - `RequestThrottle`: minimum spacing plus sliding-window cap per client
//! - `wire`: response shapes and conversion into `MarketPair`
//! - `PairSet`: order-preserving dedup by pair address
//! - `PairSource`: the seam the orchestrator scans through

pub mod client;
pub mod config;
pub mod error;
pub mod pairs;
pub mod source;
pub mod throttle;
pub mod wire;

pub use client::DexClient;
pub use config::{DexConfig, RosterEntry};
pub use error::{DexError, DexResult};
pub use pairs::PairSet;
pub use source::{DynPairSource, MockPairSource, PairSource};
pub use throttle::RequestThrottle;
pub use wire::BoostedToken;
