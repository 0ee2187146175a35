use thiserror::Error;
use crate::services::StoreError;

/// Failures surfaced by the matchmaking core
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            other => CoreError::Store(other),
        }
    }
}

impl CoreError {
    /// HTTP status code the API layer answers with
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::InvalidOperation(_) => 400,
            CoreError::Forbidden(_) => 403,
            CoreError::Store(_) => 500,
        }
    }

    /// Short machine-readable label
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "not_found",
            CoreError::InvalidOperation(_) => "invalid_operation",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::Store(_) => "storage_error",
        }
    }
}
