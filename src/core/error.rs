use thiserror::Error;

use crate::core::api::ApiError;
use crate::core::wallet::WalletError;

/// Failure classes a setup step can end in. The executor turns these into
/// persisted step statuses instead of propagating them.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is not available")]
    ToolUnavailable(String),

    #[error("{0}")]
    ExternalCall(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ApiError> for SetupError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Conflict(msg) => SetupError::Conflict(msg),
            ApiError::InvalidEndpoint(endpoint) => {
                SetupError::Validation(format!("invalid API endpoint '{}'", endpoint))
            }
            other => SetupError::ExternalCall(other.to_string()),
        }
    }
}

impl From<WalletError> for SetupError {
    fn from(err: WalletError) -> Self {
        SetupError::Validation(format!("wallet: {}", err))
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
