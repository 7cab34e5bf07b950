//! Signing and decoding of token strings

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use sha2::{Digest, Sha256};

use crate::domain::entities::{Claims, TokenClass};
use crate::errors::TokenError;

use super::key_manager::KeyRing;

/// Encodes claims into signed tokens and decodes them back.
///
/// Decoding checks signature, expiry (no leeway), issuer, audience and the
/// class claim. It never touches the credential store.
pub struct TokenCodec {
    keys: KeyRing,
    validation: Validation,
}

impl TokenCodec {
    /// Creates a codec for the given issuer and audience
    pub fn new(keys: KeyRing, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self { keys, validation }
    }

    /// Signs `claims` with the key of `claims.class`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The signed token
    /// * `Err(TokenError::MissingSigningKey)` - No key for the class
    /// * `Err(TokenError::EncodingFailed)` - Signing failed
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let key = self.keys.encoding_key(claims.class)?;
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|_| TokenError::EncodingFailed)
    }

    /// Decodes `token` with the key of `expected` and checks its class claim
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - The decoded claims
    /// * `Err(TokenError::Expired)` - Embedded expiry has passed
    /// * `Err(TokenError::ClassMismatch)` - Signature valid but wrong class
    /// * `Err(TokenError::Malformed)` - Anything else wrong with the token
    pub fn decode(&self, token: &str, expected: TokenClass) -> Result<Claims, TokenError> {
        let key = self.keys.decoding_key(expected)?;
        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            if e.kind() == &ErrorKind::ExpiredSignature {
                TokenError::Expired
            } else {
                TokenError::Malformed
            }
        })?;

        if data.claims.class != expected {
            return Err(TokenError::ClassMismatch {
                expected,
                actual: data.claims.class,
            });
        }

        Ok(data.claims)
    }
}

/// SHA-256 fingerprint of a signed token, hex encoded
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
