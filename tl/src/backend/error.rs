//! Backend error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the execution backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to create session: {0}")]
    SessionCreation(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend reported an error: {0}")]
    Remote(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::ApiError { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            BackendError::Network(_) => true,
            BackendError::Timeout(_) => true,
            BackendError::SessionCreation(_) => false,
            BackendError::Remote(_) => false,
            BackendError::InvalidResponse(_) => false,
            BackendError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            BackendError::ApiError {
                status: 502,
                message: "Bad gateway".to_string()
            }
            .is_retryable()
        );
        assert!(
            BackendError::ApiError {
                status: 429,
                message: "slow down".to_string()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::ApiError {
                status: 404,
                message: "Not found".to_string()
            }
            .is_retryable()
        );
        assert!(BackendError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!BackendError::Remote("provider overloaded".to_string()).is_retryable());
        assert!(!BackendError::InvalidResponse("Bad JSON".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = BackendError::ApiError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: boom");
    }
}
