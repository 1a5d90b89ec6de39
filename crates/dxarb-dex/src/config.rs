//! DEX adapter configuration.

use dxarb_core::{ChainId, WatchToken};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One chain of the scan roster and the search terms queried on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub chain: ChainId,
    pub seed_terms: Vec<String>,
}

impl RosterEntry {
    pub fn new(chain: &str, terms: &[&str]) -> Self {
        Self {
            chain: ChainId::new(chain),
            seed_terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// DEX adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// API root, e.g. `https://api.dexscreener.com/latest`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Boosted-tokens feed URL.
    #[serde(default = "default_boosts_url")]
    pub boosts_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum gap between two requests.
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,

    /// Sliding-window cap (0 disables).
    #[serde(default = "default_window_max_requests")]
    pub window_max_requests: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit: attempt n waits n * this.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,

    /// Search terms used when the boosted feed is unavailable.
    #[serde(default = "default_trending_terms")]
    pub trending_terms: Vec<String>,

    #[serde(default = "default_trending_per_term")]
    pub trending_per_term: usize,

    #[serde(default = "default_trending_cap")]
    pub trending_cap: usize,

    #[serde(default = "default_max_boosted_tokens")]
    pub max_boosted_tokens: usize,

    /// Upper bound on pairs handed to verification per cycle.
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,

    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<WatchToken>,

    #[serde(default = "default_watchlist_delay_ms")]
    pub watchlist_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://api.dexscreener.com/latest".to_string()
}

fn default_boosts_url() -> String {
    "https://api.dexscreener.com/token-boosts/latest/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_min_spacing_ms() -> u64 {
    1000
}

fn default_window_max_requests() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("ethereum", &["WETH", "USDT"]),
        RosterEntry::new("bsc", &["WBNB", "USDT"]),
        RosterEntry::new("solana", &["SOL", "USDC"]),
        RosterEntry::new("base", &["WETH", "USDC"]),
    ]
}

fn default_trending_terms() -> Vec<String> {
    ["PEPE", "SHIB", "DOGE", "FLOKI", "WOJAK"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_trending_per_term() -> usize {
    5
}

fn default_trending_cap() -> usize {
    30
}

fn default_max_boosted_tokens() -> usize {
    50
}

fn default_max_pairs() -> usize {
    200
}

fn default_watchlist() -> Vec<WatchToken> {
    vec![
        WatchToken::new(
            "ethereum",
            "0x95aD61b0a150d79219dCF64E1E6Cc01f0B64C4cE",
            "SHIB",
        ),
        WatchToken::new(
            "ethereum",
            "0x6982508145454Ce325dDbE47a25d4ec3d2311933",
            "PEPE",
        ),
    ]
}

fn default_watchlist_delay_ms() -> u64 {
    2000
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            boosts_url: default_boosts_url(),
            timeout_secs: default_timeout_secs(),
            min_spacing_ms: default_min_spacing_ms(),
            window_max_requests: default_window_max_requests(),
            window_secs: default_window_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            roster: default_roster(),
            trending_terms: default_trending_terms(),
            trending_per_term: default_trending_per_term(),
            trending_cap: default_trending_cap(),
            max_boosted_tokens: default_max_boosted_tokens(),
            max_pairs: default_max_pairs(),
            watchlist: default_watchlist(),
            watchlist_delay_ms: default_watchlist_delay_ms(),
        }
    }
}

impl DexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn watchlist_delay(&self) -> Duration {
        Duration::from_millis(self.watchlist_delay_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("dex.base_url must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("dex.timeout_secs must be positive".to_string());
        }
        if self.max_attempts == 0 {
            return Err("dex.max_attempts must be at least 1".to_string());
        }
        if self.max_pairs == 0 {
            return Err("dex.max_pairs must be positive".to_string());
        }
        if let Some(entry) = self.roster.iter().find(|e| e.seed_terms.is_empty()) {
            return Err(format!("dex.roster entry {} has no seed terms", entry.chain));
        }
        Ok(())
    }
}
