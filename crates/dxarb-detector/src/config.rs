//! Verifier thresholds.

use crate::error::{DetectorError, DetectorResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Admission band and market-quality floors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Lower edge of the admission band, in percent.
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: Decimal,
    /// Upper edge. Anything wider is reported but never traded.
    #[serde(default = "default_max_spread_pct")]
    pub max_spread_pct: Decimal,
    #[serde(default = "default_min_liquidity_usd")]
    pub min_liquidity_usd: Decimal,
    #[serde(default = "default_min_volume_24h_usd")]
    pub min_volume_24h_usd: Decimal,
}

fn default_min_spread_pct() -> Decimal {
    Decimal::from(2)
}

fn default_max_spread_pct() -> Decimal {
    Decimal::from(3)
}

fn default_min_liquidity_usd() -> Decimal {
    Decimal::from(10_000)
}

fn default_min_volume_24h_usd() -> Decimal {
    Decimal::from(50_000)
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: default_min_spread_pct(),
            max_spread_pct: default_max_spread_pct(),
            min_liquidity_usd: default_min_liquidity_usd(),
            min_volume_24h_usd: default_min_volume_24h_usd(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.min_spread_pct.is_sign_negative() {
            return Err(DetectorError::ConfigError(format!(
                "min_spread_pct must not be negative (got {})",
                self.min_spread_pct
            )));
        }
        if self.max_spread_pct <= self.min_spread_pct {
            return Err(DetectorError::ConfigError(format!(
                "max_spread_pct ({}) must exceed min_spread_pct ({})",
                self.max_spread_pct, self.min_spread_pct
            )));
        }
        if self.min_liquidity_usd.is_sign_negative() || self.min_volume_24h_usd.is_sign_negative() {
            return Err(DetectorError::ConfigError(
                "liquidity and volume floors must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
