//! # Agency Portal Core
//!
//! Session and token authentication core for the agency portal.
//! This crate contains the credential entities, the repository interfaces
//! the lifecycle runs against, the token services (codec, issuer, verifier,
//! rotation and revocation) and the error types shared by all of them.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::{CredentialRepository, OwnerRepository};
pub use services::{SessionService, TokenServiceConfig};
