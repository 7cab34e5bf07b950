//! Error types for token handling and authentication
//!
//! Callers outside this crate only ever see the uniform response built in
//! `errors::mod`; the detailed variants here exist for logging and tests.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::TokenClass;

/// Why a presented credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// No credential row (or owner) exists for the token
    NotFound,
    /// Single-use credential was already exchanged
    AlreadyUsed,
    /// Credential was revoked
    Revoked,
    /// Credential lifetime has elapsed
    Expired,
    /// Owner's security version moved past the one in the token
    SecurityVersionStale,
    /// Token could not be decoded or does not match its record
    InvalidCredentials,
    /// Owner account is not active
    OwnerInactive,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "not found",
            FailureReason::AlreadyUsed => "already used",
            FailureReason::Revoked => "revoked",
            FailureReason::Expired => "expired",
            FailureReason::SecurityVersionStale => "security version stale",
            FailureReason::InvalidCredentials => "invalid credentials",
            FailureReason::OwnerInactive => "owner inactive",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token encoding and decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token class mismatch: expected {expected}, found {actual}")]
    ClassMismatch {
        expected: TokenClass,
        actual: TokenClass,
    },

    #[error("Token expired")]
    Expired,

    #[error("No signing key configured for {class} tokens")]
    MissingSigningKey { class: TokenClass },

    #[error("Token encoding failed")]
    EncodingFailed,
}

impl TokenError {
    /// Reason reported when this error rejects a presented token, or `None`
    /// when the error is a server-side fault
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            TokenError::Expired => Some(FailureReason::Expired),
            TokenError::Malformed | TokenError::ClassMismatch { .. } => {
                Some(FailureReason::InvalidCredentials)
            }
            TokenError::MissingSigningKey { .. } | TokenError::EncodingFailed => None,
        }
    }
}

/// Authentication errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: FailureReason },

    #[error("Suspicious activity detected: {recent_refreshes} recent refreshes")]
    SuspiciousActivityDetected {
        owner_id: Uuid,
        recent_refreshes: u64,
    },
}

impl AuthError {
    pub fn failed(reason: FailureReason) -> Self {
        AuthError::AuthenticationFailed { reason }
    }
}
