//! CEX adapter error types.

use dxarb_core::{RetryError, Transient};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CexError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The connection was never established; the request did not leave.
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Well-formed response with a non-zero result code.
    #[error("API error rc={code}: {message}")]
    Api { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API credentials not configured")]
    MissingCredentials,

    #[error("Unavailable after {attempts} attempts: {message}")]
    Unavailable { attempts: u32, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CexError {
    pub(crate) fn from_reqwest(op: &str, e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Connect(format!("{op}: {e}"))
        } else if e.is_timeout() {
            Self::Timeout(format!("{op}: {e}"))
        } else {
            Self::Transport(format!("{op}: {e}"))
        }
    }
}

impl Transient for CexError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<RetryError<CexError>> for CexError {
    fn from(e: RetryError<CexError>) -> Self {
        match e {
            RetryError::Exhausted { attempts, last } => Self::Unavailable {
                attempts,
                message: last.to_string(),
            },
            RetryError::Permanent(e) => e,
        }
    }
}

/// Order submission error.
///
/// Only a failed connect is retried: once a request may have reached the
/// exchange, a second submission could fill twice.
#[derive(Debug)]
pub(crate) struct SubmitError(pub CexError);

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Transient for SubmitError {
    fn is_transient(&self) -> bool {
        matches!(self.0, CexError::Connect(_))
    }
}

impl From<RetryError<SubmitError>> for CexError {
    fn from(e: RetryError<SubmitError>) -> Self {
        match e {
            RetryError::Exhausted { attempts, last } => Self::Unavailable {
                attempts,
                message: last.to_string(),
            },
            RetryError::Permanent(e) => e.0,
        }
    }
}

pub type CexResult<T> = Result<T, CexError>;
