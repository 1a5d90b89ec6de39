//! Prometheus metrics for the dxarb bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error and should crash at
//! first use rather than run without metrics.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec, CounterVec,
    Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};

/// Pairs returned by the DEX adapter, after dedup.
/// Labels: source (scan/watchlist)
pub static PAIRS_SCANNED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dxarb_pairs_scanned_total",
        "Candidate pairs handed to verification",
        &["source"]
    )
    .unwrap()
});

/// Verification outcomes.
/// Labels: action (skip/notify/execute)
pub static VERIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dxarb_verifications_total",
        "Spread verifications by resulting action",
        &["action"]
    )
    .unwrap()
});

/// Accepted orders.
pub static TRADES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("dxarb_trades_total", "Orders accepted by the CEX", &["side"]).unwrap()
});

/// Errors by kind (pair/cycle/execution/notify/persist).
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("dxarb_errors_total", "Errors by kind", &["kind"]).unwrap()
});

/// Observed spread for pairs that had a quote.
pub static SPREAD_PERCENT: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dxarb_spread_percent",
        "DEX/CEX spread in percent",
        &["chain"],
        vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .unwrap()
});

/// Venue request latency including retries.
/// Labels: venue (dex/cex), op
pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dxarb_request_latency_ms",
        "Venue request latency in milliseconds",
        &["venue", "op"],
        vec![25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0]
    )
    .unwrap()
});

/// Full scan cycle duration.
pub static CYCLE_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "dxarb_cycle_duration_ms",
        "Scan cycle duration in milliseconds",
        vec![500.0, 1000.0, 5000.0, 10000.0, 30000.0, 60000.0, 120000.0, 300000.0]
    )
    .unwrap()
});

/// Live trading switch state (1 = on).
pub static LIVE_TRADING: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("dxarb_live_trading", "Live trading switch (1=on)").unwrap()
});

/// Notification sends.
/// Labels: kind, outcome (sent/failed)
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dxarb_notifications_total",
        "Outbound notifications",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Metrics helper for common operations.
pub struct Metrics;

impl Metrics {
    pub fn pairs_scanned(source: &str, count: usize) {
        PAIRS_SCANNED_TOTAL
            .with_label_values(&[source])
            .inc_by(count as f64);
    }

    pub fn verification(action: &str) {
        VERIFICATIONS_TOTAL.with_label_values(&[action]).inc();
    }

    pub fn trade_executed(side: &str) {
        TRADES_TOTAL.with_label_values(&[side]).inc();
    }

    pub fn error(kind: &str) {
        ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn spread_observed(chain: &str, spread_pct: f64) {
        SPREAD_PERCENT.with_label_values(&[chain]).observe(spread_pct);
    }

    pub fn request_latency(venue: &str, op: &str, latency_ms: f64) {
        REQUEST_LATENCY_MS
            .with_label_values(&[venue, op])
            .observe(latency_ms);
    }

    pub fn cycle_duration(duration_ms: f64) {
        CYCLE_DURATION_MS.observe(duration_ms);
    }

    pub fn live_trading(enabled: bool) {
        LIVE_TRADING.set(if enabled { 1.0 } else { 0.0 });
    }

    pub fn notification(kind: &str, sent: bool) {
        let outcome = if sent { "sent" } else { "failed" };
        NOTIFICATIONS_TOTAL.with_label_values(&[kind, outcome]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn render() -> String {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
