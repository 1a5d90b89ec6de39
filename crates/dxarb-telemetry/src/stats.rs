//! Process-wide run statistics.
//!
//! The scan loop and the command loop both touch these counters, so every
//! update goes through one mutex. Counters also feed Prometheus so the two
//! views never drift apart.

use crate::metrics::Metrics;
use chrono::{DateTime, Utc};
use dxarb_core::BotStats;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Shared counters for one run.
#[derive(Debug)]
pub struct StatsRecorder {
    stats: Mutex<BotStats>,
    started: Instant,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(BotStats::default()),
            started: Instant::now(),
        }
    }

    pub fn record_processed(&self) {
        self.stats.lock().signals_processed += 1;
    }

    pub fn record_valid(&self) {
        self.stats.lock().signals_valid += 1;
    }

    pub fn record_trade(&self, side: &str) {
        self.stats.lock().trades_executed += 1;
        Metrics::trade_executed(side);
    }

    pub fn record_error(&self, kind: &str) {
        self.stats.lock().errors_count += 1;
        Metrics::error(kind);
    }

    /// Stamp the heartbeat time and return the updated snapshot.
    pub fn mark_heartbeat(&self) -> BotStats {
        let mut stats = self.stats.lock();
        stats.last_heartbeat = Some(Utc::now());
        stats.clone()
    }

    pub fn snapshot(&self) -> BotStats {
        self.stats.lock().clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.stats.lock().started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// `1d 2h 3m`, `2h 3m`, or `3m 4s`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}
