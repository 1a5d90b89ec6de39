//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("DEX error: {0}")]
    Dex(#[from] dxarb_dex::DexError),

    #[error("CEX error: {0}")]
    Cex(#[from] dxarb_cex::CexError),

    #[error("Detector error: {0}")]
    Detector(#[from] dxarb_detector::DetectorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] dxarb_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] dxarb_persistence::PersistenceError),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shutdown requested")]
    Shutdown,
}

pub type AppResult<T> = Result<T, AppError>;
