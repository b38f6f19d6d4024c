//! Service error taxonomy
//!
//! Every public operation resolves to a structured success or failure value;
//! these variants classify what went wrong so callers and the fallback logic
//! can branch without parsing message text.

use thiserror::Error;

/// Errors raised by the image service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input: empty query, missing file, non-image content type.
    /// Returned immediately, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network error, non-2xx status, or timeout. Triggers fallback to the
    /// next URL template or strategy before being surfaced.
    #[error("transport failed: {0}")]
    Transport(String),

    /// Missing browser binary or a crashed driver session. Downgrades the
    /// search to the HTTP strategy; never fatal to the overall operation.
    #[error("environment failure: {0}")]
    Environment(String),

    /// Source blocked by the royalty-free domain denylist. Per-item; does
    /// not abort batch operations.
    #[error("policy violation: {0}")]
    Policy(String),

    /// Blob store put/get/signing failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Short machine-readable kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::Environment(_) => "environment",
            Self::Policy(_) => "policy",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Convenience alias used throughout the crate
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
