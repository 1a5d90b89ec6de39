//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,dxarb=debug";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    Text,
    /// JSON lines for log shipping.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::LoggingInit(format!(
                "unknown log format {other:?}"
            ))),
        }
    }
}

impl LogFormat {
    /// `DXARB_LOG_FORMAT` when set, otherwise JSON under
    /// `RUST_ENV=production` and text elsewhere.
    pub fn from_env() -> TelemetryResult<Self> {
        Self::resolve(
            std::env::var("DXARB_LOG_FORMAT").ok().as_deref(),
            std::env::var("RUST_ENV").ok().as_deref(),
        )
    }

    fn resolve(explicit: Option<&str>, rust_env: Option<&str>) -> TelemetryResult<Self> {
        match explicit {
            Some(format) => format.parse(),
            None if rust_env == Some("production") => Ok(Self::Json),
            None => Ok(Self::Text),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(LogFormat::from_env()?)
}

pub fn init_logging_with(format: LogFormat) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
