//! Client error types

use floor_engine::StoreError;
use shared::error::ErrorCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a business error
    #[error("{message} (code {code})")]
    Api { code: ErrorCode, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Business error code, when the server sent one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ClientError> for StoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { code, message } => StoreError::Rejected { code, message },
            ClientError::NotFound(msg) => StoreError::rejected(ErrorCode::NotFound, msg),
            ClientError::Validation(msg) => StoreError::rejected(ErrorCode::ValidationFailed, msg),
            ClientError::Internal(msg) => StoreError::rejected(ErrorCode::InternalError, msg),
            ClientError::Http(e) => StoreError::Transport(e.to_string()),
            ClientError::InvalidResponse(msg) => StoreError::InvalidResponse(msg),
            ClientError::Serialization(e) => StoreError::InvalidResponse(e.to_string()),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err = ClientError::Api {
            code: ErrorCode::TableGrouped,
            message: "grouped".to_string(),
        };
        assert_eq!(err.code(), Some(ErrorCode::TableGrouped));
        let store: StoreError = err.into();
        assert_eq!(store.code(), Some(ErrorCode::TableGrouped));

        let store: StoreError = ClientError::InvalidResponse("x".to_string()).into();
        assert!(matches!(store, StoreError::InvalidResponse(_)));
    }
}
