//! Shared configuration and response types for the agency portal server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types
//! - Error response structures

pub mod config;
pub mod errors;

pub use config::{
    AppConfig, AuthConfig, DatabaseConfig, Environment, LogFormat, LoggingConfig,
    SigningKeysConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
