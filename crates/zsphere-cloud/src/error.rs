//! Cloud platform error types

use thiserror::Error;

/// Errors raised by the platform client and the state store
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
