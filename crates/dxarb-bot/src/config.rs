//! Application configuration.
//!
//! Layering, last wins:
//! 1. serde defaults
//! 2. TOML file (`--config`, `DXARB_CONFIG`, or `config/default.toml` if present)
//! 3. `DXARB__SECTION__KEY` environment variables
//! 4. flat operator variables (`ALLOW_LIVE_TRADING`, `MIN_SPREAD_PERCENT`, ...)

use crate::error::{AppError, AppResult};
use dxarb_cex::CexConfig;
use dxarb_core::ChainId;
use dxarb_dashboard::DashboardConfig;
use dxarb_detector::VerifierConfig;
use dxarb_dex::DexConfig;
use dxarb_executor::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config file used when neither the CLI nor `DXARB_CONFIG` names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Scan loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Pause between scan cycles.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Back-off after a failed cycle.
    #[serde(default = "default_error_cooldown_secs")]
    pub error_cooldown_secs: u64,
    /// Pairs verified concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Query roster chains in parallel.
    #[serde(default)]
    pub concurrent_fetch: bool,
    /// Initial state of the live-trading switch.
    #[serde(default)]
    pub live_trading: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Journal records buffered before a write.
    #[serde(default = "default_journal_buffer")]
    pub journal_buffer: usize,
}

fn default_scan_interval_secs() -> u64 {
    5
}

fn default_error_cooldown_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    20
}

fn default_batch_pause_ms() -> u64 {
    1000
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_journal_buffer() -> usize {
    100
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            error_cooldown_secs: default_error_cooldown_secs(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            concurrent_fetch: false,
            live_trading: false,
            data_dir: default_data_dir(),
            journal_buffer: default_journal_buffer(),
        }
    }
}

impl BotConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Telegram Bot API settings. Empty token or chat disables Telegram.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives notifications and may issue commands.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// `getUpdates` long-poll timeout.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bot_token.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("TelegramConfig")
            .field("bot_token", &token)
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl TelegramConfig {
    pub fn enabled(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// JSON-RPC endpoints polled for the latest block or slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainHeadConfig {
    /// Chain name → RPC URL.
    #[serde(default = "default_rpc")]
    pub rpc: BTreeMap<String, String>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("ethereum".to_string(), "https://eth.llamarpc.com".to_string()),
        (
            "bsc".to_string(),
            "https://bsc-dataseed.binance.org".to_string(),
        ),
    ])
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

impl Default for ChainHeadConfig {
    fn default() -> Self {
        Self {
            rpc: default_rpc(),
            timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

impl ChainHeadConfig {
    pub fn endpoints(&self) -> Vec<(ChainId, String)> {
        self.rpc
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(chain, url)| (ChainId::new(chain), url.trim().to_string()))
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub dex: DexConfig,
    #[serde(default)]
    pub cex: CexConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub chains: ChainHeadConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Load from `path` (or the default file when present) plus the process
    /// environment, then validate.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with flat operator variables read
    /// through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };

        let mut config: AppConfig = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("DXARB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;

        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the flat operator variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ALLOW_LIVE_TRADING") {
            self.bot.live_trading = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = parse_var(&get, "MIN_SPREAD_PERCENT")? {
            self.verifier.min_spread_pct = v;
        }
        if let Some(v) = parse_var(&get, "MAX_SPREAD_PERCENT")? {
            self.verifier.max_spread_pct = v;
        }
        if let Some(v) = parse_var(&get, "MIN_LIQUIDITY_USD")? {
            self.verifier.min_liquidity_usd = v;
        }
        if let Some(v) = parse_var(&get, "MIN_VOLUME_24H_USD")? {
            self.verifier.min_volume_24h_usd = v;
        }
        if let Some(v) = parse_var(&get, "HEARTBEAT_INTERVAL")? {
            self.bot.heartbeat_interval_secs = v;
        }
        if let Some(v) = parse_var(&get, "PORT")? {
            self.dashboard.port = v;
        }

        for (key, chain) in [
            ("ETH_RPC_URL", "ethereum"),
            ("BSC_RPC_URL", "bsc"),
            ("SOL_RPC_URL", "solana"),
        ] {
            if let Some(url) = get(key) {
                self.chains.rpc.insert(chain.to_string(), url.trim().to_string());
            }
        }

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v.trim().to_string();
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.bot.scan_interval_secs == 0 {
            return Err(AppError::Config("bot.scan_interval_secs must be > 0".to_string()));
        }
        if self.bot.batch_size == 0 {
            return Err(AppError::Config("bot.batch_size must be > 0".to_string()));
        }
        if self.bot.heartbeat_interval_secs == 0 {
            return Err(AppError::Config(
                "bot.heartbeat_interval_secs must be > 0".to_string(),
            ));
        }
        if self.bot.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("bot.data_dir must not be empty".to_string()));
        }
        if !self.telegram.bot_token.is_empty() && self.telegram.chat_id.is_empty() {
            return Err(AppError::Config(
                "telegram.chat_id must be set when telegram.bot_token is".to_string(),
            ));
        }

        self.dex.validate().map_err(AppError::Config)?;
        self.cex.validate().map_err(AppError::Config)?;
        self.executor.validate().map_err(AppError::Config)?;
        self.dashboard.validate().map_err(AppError::Config)?;
        self.verifier.validate()?;
        Ok(())
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid {key}={raw}: {e}"))),
        None => Ok(None),
    }
}
