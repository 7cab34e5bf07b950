//! Session value objects returned by the token services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Role, TokenClass};

/// A freshly signed token together with the credential backing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Signed token string handed to the client
    pub token: String,

    /// Id of the credential row, also the token's `jti`
    pub credential_id: Uuid,

    /// Class the token was issued for
    pub class: TokenClass,

    /// Expiry recorded on the credential
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds until expiry, never negative
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Access and refresh token pair handed out on login and rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token for API authentication
    pub access_token: String,

    /// JWT refresh token for obtaining a new pair
    pub refresh_token: String,

    /// Access token expiration time in seconds
    pub access_expires_in: i64,

    /// Refresh token expiration time in seconds
    pub refresh_expires_in: i64,

    /// Credential backing the access token
    #[serde(skip)]
    pub access_credential_id: Uuid,

    /// Credential backing the refresh token
    #[serde(skip)]
    pub refresh_credential_id: Uuid,
}

impl TokenPair {
    /// Creates a new token pair from the two issued tokens
    ///
    /// # Arguments
    ///
    /// * `access` - Issued access token
    /// * `refresh` - Issued refresh token
    ///
    /// # Returns
    ///
    /// A new `TokenPair` instance
    pub fn new(access: IssuedToken, refresh: IssuedToken) -> Self {
        Self {
            access_expires_in: access.expires_in(),
            refresh_expires_in: refresh.expires_in(),
            access_credential_id: access.credential_id,
            refresh_credential_id: refresh.credential_id,
            access_token: access.token,
            refresh_token: refresh.token,
        }
    }
}

/// Identity attached to a request after its access token verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedOwner {
    pub owner_id: Uuid,
    pub email: String,
    pub role: Role,

    /// Credential the request authenticated with
    pub credential_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn issued(class: TokenClass, ttl: Duration) -> IssuedToken {
        IssuedToken {
            token: format!("{}-token", class),
            credential_id: Uuid::new_v4(),
            class,
            expires_at: Utc::now() + ttl,
        }
    }

    #[test]
    fn test_token_pair_keeps_credential_ids() {
        let access = issued(TokenClass::Access, Duration::hours(24));
        let refresh = issued(TokenClass::Refresh, Duration::days(14));
        let access_id = access.credential_id;
        let refresh_id = refresh.credential_id;

        let pair = TokenPair::new(access, refresh);

        assert_eq!(pair.access_token, "access-token");
        assert_eq!(pair.refresh_token, "refresh-token");
        assert_eq!(pair.access_credential_id, access_id);
        assert_eq!(pair.refresh_credential_id, refresh_id);
        assert!(pair.access_expires_in > 24 * 3600 - 5);
        assert!(pair.refresh_expires_in > pair.access_expires_in);
    }

    #[test]
    fn test_serialized_pair_hides_credential_ids() {
        let pair = TokenPair::new(
            issued(TokenClass::Access, Duration::minutes(5)),
            issued(TokenClass::Refresh, Duration::minutes(10)),
        );

        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("access_credential_id").is_none());
        assert!(json.get("access_token").is_some());
    }

    #[test]
    fn test_expires_in_clamps_at_zero() {
        let token = issued(TokenClass::PasswordReset, Duration::minutes(-1));
        assert_eq!(token.expires_in(), 0);
    }
}
