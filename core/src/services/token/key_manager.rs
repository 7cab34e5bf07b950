//! Per-class HS256 signing keys

use std::collections::HashMap;

use agency_shared::config::{Environment, SigningKeysConfig};
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::warn;

use crate::domain::entities::TokenClass;
use crate::errors::{DomainError, TokenError};

#[derive(Clone)]
struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl ClassKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signing keys for each token class
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: HashMap<TokenClass, ClassKeys>,
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut classes: Vec<&str> = self.keys.keys().map(|c| c.as_str()).collect();
        classes.sort_unstable();
        f.debug_struct("KeyRing").field("classes", &classes).finish()
    }
}

impl KeyRing {
    /// Creates an empty key ring
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the key ring from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Configured secrets, empty strings meaning unset
    /// * `environment` - Deployment environment
    ///
    /// # Returns
    ///
    /// * `Ok(KeyRing)` - A key for every class
    /// * `Err(DomainError::Configuration)` - A secret is unset outside development
    ///
    /// In development an unset secret is replaced by a fixed per-class
    /// placeholder and a warning is logged.
    pub fn from_config(
        config: &SigningKeysConfig,
        environment: Environment,
    ) -> Result<Self, DomainError> {
        let missing = config.missing();
        if !missing.is_empty() && !environment.is_development() {
            return Err(DomainError::Configuration {
                message: format!(
                    "signing secret not configured for {} tokens in {} environment",
                    missing.join(", "),
                    environment
                ),
            });
        }

        let mut ring = Self::empty();
        for class in TokenClass::ALL {
            let secret = configured_secret(config, class);
            if secret.is_empty() {
                warn!(
                    class = %class,
                    "No signing secret configured, using development placeholder"
                );
                ring = ring.with_secret(class, &development_secret(class));
            } else {
                ring = ring.with_secret(class, secret);
            }
        }
        Ok(ring)
    }

    /// Adds or replaces the key for `class`
    pub fn with_secret(mut self, class: TokenClass, secret: &str) -> Self {
        self.keys.insert(class, ClassKeys::from_secret(secret));
        self
    }

    /// Gets the signing key for `class`
    pub fn encoding_key(&self, class: TokenClass) -> Result<&EncodingKey, TokenError> {
        self.keys
            .get(&class)
            .map(|keys| &keys.encoding)
            .ok_or(TokenError::MissingSigningKey { class })
    }

    /// Gets the verification key for `class`
    pub fn decoding_key(&self, class: TokenClass) -> Result<&DecodingKey, TokenError> {
        self.keys
            .get(&class)
            .map(|keys| &keys.decoding)
            .ok_or(TokenError::MissingSigningKey { class })
    }
}

fn configured_secret(config: &SigningKeysConfig, class: TokenClass) -> &str {
    match class {
        TokenClass::Access => &config.access_secret,
        TokenClass::Refresh => &config.refresh_secret,
        TokenClass::PasswordReset => &config.password_reset_secret,
        TokenClass::EmailVerification => &config.email_verification_secret,
    }
}

fn development_secret(class: TokenClass) -> String {
    format!("agency-portal-development-{}-secret", class)
}
