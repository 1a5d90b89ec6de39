//! Spread verification for DEX/CEX price divergence.
//!
//! Compares a DEX pair price with the CEX last price and decides whether
//! the divergence is worth skipping, reporting or trading.

pub mod config;
pub mod error;
pub mod signal;
pub mod verifier;

pub use config::VerifierConfig;
pub use error::{DetectorError, DetectorResult};
pub use signal::SpreadSignal;
pub use verifier::SpreadVerifier;
