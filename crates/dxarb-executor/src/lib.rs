//! Trade execution for dxarb.
//!
//! Turns executable spread signals into CEX market orders, at most one per
//! symbol per scan cycle, and records every accepted order.

pub mod config;
pub mod executor;

pub use config::ExecutorConfig;
pub use executor::{ExecutionOutcome, SkipReason, TradeExecutor};
