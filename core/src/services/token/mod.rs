//! Token lifecycle services
//!
//! This module handles every credential operation:
//! - Per-class HS256 signing keys and token encoding
//! - Issuance bound to a stored credential record
//! - Verification against the record and the owner's security version
//! - Refresh rotation with abuse detection
//! - Owner-scoped revocation

mod codec;
mod config;
mod issuer;
mod key_manager;
mod revocation;
mod rotation;
mod service;
mod verifier;

#[cfg(test)]
mod tests;

pub use codec::{fingerprint, TokenCodec};
pub use config::TokenServiceConfig;
pub use issuer::TokenIssuer;
pub use key_manager::KeyRing;
pub use revocation::{RevocationService, RevokeRequest};
pub use rotation::RotationController;
pub use service::SessionService;
pub use verifier::{TokenVerifier, VerifiedCredential};
