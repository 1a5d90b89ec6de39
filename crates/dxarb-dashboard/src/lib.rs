//! dxarb-dashboard - read-only status surface for the dxarb bot.
//!
//! Serves the persisted run statistics and trade history as JSON, plus the
//! Prometheus text exposition. Every request reads the state files afresh;
//! nothing here can change bot state.
//!
//! ```text
//! GET /health       → liveness, never authenticated
//! GET /api/status   → stats, positions, live-trading flag, uptime
//! GET /api/trades   → newest trades first (`?limit=`, default 50)
//! GET /metrics      → Prometheus text format
//! ```

mod config;
mod server;
mod state;
mod types;

pub use config::DashboardConfig;
pub use server::{create_router, run_server};
pub use state::DashboardState;
pub use types::{HealthResponse, StatusResponse, TradesResponse};
