//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, FailureReason, TokenError};

use agency_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Message shown to clients for every rejected credential
pub const SESSION_ENDED_MESSAGE: &str = "Please log in again";

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Credential store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand for a rejected credential
    pub fn authentication_failed(reason: FailureReason) -> Self {
        DomainError::Auth(AuthError::failed(reason))
    }

    /// Reason a presented credential was rejected, if that is what happened
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            DomainError::Auth(AuthError::AuthenticationFailed { reason }) => Some(*reason),
            DomainError::Token(error) => error.failure_reason(),
            _ => None,
        }
    }

    /// True for every error that must end the client's session
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            DomainError::Auth(AuthError::SuspiciousActivityDetected { .. })
        ) || self.failure_reason().is_some()
    }

    /// True when the same call may succeed later without client changes
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::StoreUnavailable { .. })
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::from(self)
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(error: &DomainError) -> Self {
        if error.is_authentication_failure() {
            return ErrorResponse::new(error_codes::UNAUTHORIZED, SESSION_ENDED_MESSAGE);
        }

        match error {
            DomainError::StoreUnavailable { .. } => ErrorResponse::new(
                error_codes::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
            .retryable(),
            DomainError::InvalidArgument { message } => {
                ErrorResponse::new(error_codes::BAD_REQUEST, message.clone())
            }
            _ => ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error"),
        }
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(error: DomainError) -> Self {
        ErrorResponse::from(&error)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
