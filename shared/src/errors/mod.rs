//! Shared error types and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard error response structure handed to the HTTP layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Whether the client may retry the same request later
    #[serde(default)]
    pub retryable: bool,

    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            retryable: false,
            timestamp: Utc::now(),
        }
    }

    /// Mark the response as retryable
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// HTTP status code the response maps to
    pub fn status_code(&self) -> u16 {
        match self.error.as_str() {
            error_codes::UNAUTHORIZED => 401,
            error_codes::BAD_REQUEST => 400,
            error_codes::SERVICE_UNAVAILABLE => 503,
            _ => 500,
        }
    }
}

/// Common error codes used across the application
pub mod error_codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Trait for converting errors to ErrorResponse
pub trait IntoErrorResponse {
    fn to_error_response(&self) -> ErrorResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorResponse::new(error_codes::UNAUTHORIZED, "x").status_code(), 401);
        assert_eq!(ErrorResponse::new(error_codes::BAD_REQUEST, "x").status_code(), 400);
        assert_eq!(
            ErrorResponse::new(error_codes::SERVICE_UNAVAILABLE, "x").status_code(),
            503
        );
        assert_eq!(ErrorResponse::new("SOMETHING_ELSE", "x").status_code(), 500);
    }

    #[test]
    fn test_retryable() {
        let response = ErrorResponse::new(error_codes::SERVICE_UNAVAILABLE, "try later");
        assert!(!response.retryable);
        assert!(response.retryable().retryable);
    }
}
