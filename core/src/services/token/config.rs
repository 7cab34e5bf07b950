//! Configuration for the token services

use agency_shared::config::AuthConfig;
use chrono::Duration;

use crate::domain::entities::TokenClass;

/// Configuration for the token services
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT issuer claim
    pub issuer: String,
    /// JWT audience claim
    pub audience: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Password reset token lifetime
    pub password_reset_ttl: Duration,
    /// Email verification token lifetime
    pub email_verification_ttl: Duration,
    /// Refreshes allowed per owner inside `refresh_window`
    pub max_refreshes_per_window: u64,
    /// Trailing window for refresh abuse detection
    pub refresh_window: Duration,
}

impl TokenServiceConfig {
    /// Lifetime of a credential of `class`
    pub fn ttl(&self, class: TokenClass) -> Duration {
        match class {
            TokenClass::Access => self.access_token_ttl,
            TokenClass::Refresh => self.refresh_token_ttl,
            TokenClass::PasswordReset => self.password_reset_ttl,
            TokenClass::EmailVerification => self.email_verification_ttl,
        }
    }
}

impl From<&AuthConfig> for TokenServiceConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
            password_reset_ttl: Duration::minutes(config.password_reset_ttl_minutes),
            email_verification_ttl: Duration::minutes(config.email_verification_ttl_minutes),
            max_refreshes_per_window: config.max_refreshes_per_window,
            refresh_window: Duration::minutes(config.refresh_window_minutes),
        }
    }
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}
