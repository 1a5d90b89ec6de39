//! CEX adapter configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CexConfig {
    /// REST root, e.g. `https://sapi.xt.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit: attempt n waits n * this.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Instrument catalog refresh interval.
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,

    /// Quote asset preferred when resolving symbols.
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Levels requested from the depth endpoint.
    #[serde(default = "default_depth_limit")]
    pub depth_limit: u32,
}

fn default_base_url() -> String {
    "https://sapi.xt.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_catalog_ttl_secs() -> u64 {
    300
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_depth_limit() -> u32 {
    20
}

impl Default for CexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
            quote_asset: default_quote_asset(),
            depth_limit: default_depth_limit(),
        }
    }
}

impl CexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("cex.base_url must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("cex.timeout_secs must be positive".to_string());
        }
        if self.max_attempts == 0 {
            return Err("cex.max_attempts must be at least 1".to_string());
        }
        if self.quote_asset.trim().is_empty() {
            return Err("cex.quote_asset must not be empty".to_string());
        }
        if self.depth_limit == 0 {
            return Err("cex.depth_limit must be positive".to_string());
        }
        Ok(())
    }
}
