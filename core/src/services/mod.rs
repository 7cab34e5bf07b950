//! Business services containing the token lifecycle.

pub mod token;

// Re-export commonly used types
pub use token::{
    KeyRing, RevocationService, RevokeRequest, RotationController, SessionService, TokenCodec,
    TokenIssuer, TokenServiceConfig, TokenVerifier, VerifiedCredential,
};
