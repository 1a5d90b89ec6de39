//! DEX adapter error types.

use dxarb_core::{RetryError, Transient};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DexError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unavailable after {attempts} attempts: {message}")]
    Unavailable { attempts: u32, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Transient for DexError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<RetryError<DexError>> for DexError {
    fn from(e: RetryError<DexError>) -> Self {
        match e {
            RetryError::Exhausted { attempts, last } => Self::Unavailable {
                attempts,
                message: last.to_string(),
            },
            RetryError::Permanent(e) => e,
        }
    }
}

pub type DexResult<T> = Result<T, DexError>;
