//! Prometheus metrics, run statistics and structured logging for dxarb.
//!
//! - Prometheus metrics for scans, verifications, trades and venue latency
//! - Structured logging with tracing (JSON in production)
//! - `StatsRecorder`: the process-wide counters shown in heartbeats

pub mod error;
pub mod logging;
pub mod metrics;
pub mod stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use metrics::Metrics;
pub use stats::{format_uptime, StatsRecorder};
