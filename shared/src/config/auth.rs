//! Authentication and token lifecycle configuration

use serde::{Deserialize, Serialize};

/// Signing secrets, one per token class.
///
/// Each class signs with its own secret so a leaked key only compromises
/// one kind of credential. An empty string means "not configured".
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningKeysConfig {
    /// Secret for access tokens
    pub access_secret: String,

    /// Secret for refresh tokens
    pub refresh_secret: String,

    /// Secret for password reset tokens
    pub password_reset_secret: String,

    /// Secret for email verification tokens
    pub email_verification_secret: String,
}

impl SigningKeysConfig {
    /// Use the same secret for every class. Only meant for tests.
    pub fn uniform(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            access_secret: secret.clone(),
            refresh_secret: secret.clone(),
            password_reset_secret: secret.clone(),
            email_verification_secret: secret,
        }
    }

    /// Names of the classes that have no secret configured
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_secret.is_empty() {
            missing.push("access");
        }
        if self.refresh_secret.is_empty() {
            missing.push("refresh");
        }
        if self.password_reset_secret.is_empty() {
            missing.push("password_reset");
        }
        if self.email_verification_secret.is_empty() {
            missing.push("email_verification");
        }
        missing
    }
}

impl std::fmt::Debug for SigningKeysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &str) -> &'static str {
            if secret.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("SigningKeysConfig")
            .field("access_secret", &redact(&self.access_secret))
            .field("refresh_secret", &redact(&self.refresh_secret))
            .field("password_reset_secret", &redact(&self.password_reset_secret))
            .field(
                "email_verification_secret",
                &redact(&self.email_verification_secret),
            )
            .finish()
    }
}

/// Token lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,

    /// Per-class signing secrets
    pub keys: SigningKeysConfig,

    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,

    /// Password reset token lifetime in minutes
    pub password_reset_ttl_minutes: i64,

    /// Email verification token lifetime in minutes
    pub email_verification_ttl_minutes: i64,

    /// Refreshes allowed per owner inside the trailing window
    pub max_refreshes_per_window: u64,

    /// Length of the trailing refresh window in minutes
    pub refresh_window_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: String::from("agency-portal"),
            audience: String::from("agency-portal-api"),
            keys: SigningKeysConfig::default(),
            access_token_ttl_minutes: 24 * 60,
            refresh_token_ttl_days: 14,
            password_reset_ttl_minutes: 30,
            email_verification_ttl_minutes: 60,
            max_refreshes_per_window: 5,
            refresh_window_minutes: 60,
        }
    }
}

impl AuthConfig {
    /// Create a configuration with the given signing keys and default lifetimes
    pub fn with_keys(keys: SigningKeysConfig) -> Self {
        Self {
            keys,
            ..Default::default()
        }
    }

    /// Set the refresh abuse threshold
    pub fn with_refresh_limit(mut self, max_refreshes: u64, window_minutes: i64) -> Self {
        self.max_refreshes_per_window = max_refreshes;
        self.refresh_window_minutes = window_minutes;
        self
    }
}
