//! Credential entities backing every issued token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::owner::{Owner, Role};

/// Purpose category of a credential. Each class has its own lifetime and
/// its own signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Short-lived bearer token presented on every protected request
    Access,
    /// Long-lived, single-use token exchanged for a new pair
    Refresh,
    /// Single-use token authorising a password reset
    PasswordReset,
    /// Single-use token confirming ownership of an email address
    EmailVerification,
}

impl TokenClass {
    /// Every class, in a stable order
    pub const ALL: [TokenClass; 4] = [
        TokenClass::Access,
        TokenClass::Refresh,
        TokenClass::PasswordReset,
        TokenClass::EmailVerification,
    ];

    /// Storage / claim representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
            TokenClass::PasswordReset => "password_reset",
            TokenClass::EmailVerification => "email_verification",
        }
    }

    /// Whether presenting the credential consumes it
    pub fn is_single_use(&self) -> bool {
        !matches!(self, TokenClass::Access)
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenClass::Access),
            "refresh" => Ok(TokenClass::Refresh),
            "password_reset" => Ok(TokenClass::PasswordReset),
            "email_verification" => Ok(TokenClass::EmailVerification),
            other => Err(format!("Unknown token class: {}", other)),
        }
    }
}

/// Persisted record of one issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Store-assigned identifier, embedded in the token as `jti`
    pub id: Uuid,

    /// Owner the credential authenticates
    pub owner_id: Uuid,

    /// Purpose of the credential
    pub class: TokenClass,

    /// Owner's security version when the credential was issued
    pub security_version: i64,

    /// SHA-256 fingerprint of the signed token, attached after signing
    pub token_hash: Option<String>,

    /// Timestamp when the credential was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp when the credential expires
    pub expires_at: DateTime<Utc>,

    /// Set once a single-use credential has been exchanged
    pub used: bool,

    /// Non-null means void regardless of expiry
    pub revoked_at: Option<DateTime<Utc>>,

    /// Last time this credential was exchanged (refresh only)
    pub last_refreshed_at: Option<DateTime<Utc>>,

    /// Number of exchanges recorded on this credential (refresh only)
    pub refresh_count: i64,
}

impl Credential {
    /// Checks if the credential has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks if the credential has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Unused, unrevoked and unexpired at `now`. Does not look at the owner.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_revoked() && !self.is_expired_at(now)
    }
}

/// Credential fields supplied by the issuer; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub owner_id: Uuid,
    pub class: TokenClass,
    pub security_version: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewCredential {
    /// Materialise the record under the id chosen by the store
    pub fn into_credential(self, id: Uuid) -> Credential {
        Credential {
            id,
            owner_id: self.owner_id,
            class: self.class,
            security_version: self.security_version,
            token_hash: None,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            used: false,
            revoked_at: None,
            last_refreshed_at: None,
            refresh_count: 0,
        }
    }
}

/// Signed token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (owner ID)
    pub sub: String,

    /// Owner email at issue time
    pub email: String,

    /// Owner role at issue time
    pub role: Role,

    /// Owner security version at issue time
    pub sv: i64,

    /// Token class
    pub class: TokenClass,

    /// JWT ID, equal to the credential id
    pub jti: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,
}

impl Claims {
    /// Build the claims for a freshly created credential
    pub fn for_credential(
        owner: &Owner,
        credential: &Credential,
        issuer: &str,
        audience: &str,
    ) -> Self {
        Self {
            sub: owner.id.to_string(),
            email: owner.email.clone(),
            role: owner.role,
            sv: credential.security_version,
            class: credential.class,
            jti: credential.id.to_string(),
            iat: credential.issued_at.timestamp(),
            exp: credential.expires_at.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    /// Gets the owner ID from the claims
    pub fn owner_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Gets the credential ID from the claims
    pub fn credential_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.jti)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_credential(class: TokenClass) -> Credential {
        let now = Utc::now();
        NewCredential {
            owner_id: Uuid::new_v4(),
            class,
            security_version: 3,
            issued_at: now,
            expires_at: now + Duration::hours(1),
        }
        .into_credential(Uuid::new_v4())
    }

    #[test]
    fn test_token_class_round_trip_through_str() {
        for class in TokenClass::ALL {
            assert_eq!(class.as_str().parse::<TokenClass>().unwrap(), class);
        }
        assert!("bearer".parse::<TokenClass>().is_err());
    }

    #[test]
    fn test_token_class_serializes_snake_case() {
        let json = serde_json::to_string(&TokenClass::PasswordReset).unwrap();
        assert_eq!(json, "\"password_reset\"");
    }

    #[test]
    fn test_only_access_is_reusable() {
        assert!(!TokenClass::Access.is_single_use());
        assert!(TokenClass::Refresh.is_single_use());
        assert!(TokenClass::PasswordReset.is_single_use());
        assert!(TokenClass::EmailVerification.is_single_use());
    }

    #[test]
    fn test_new_credential_starts_live() {
        let credential = sample_credential(TokenClass::Refresh);

        assert!(!credential.used);
        assert!(!credential.is_revoked());
        assert_eq!(credential.refresh_count, 0);
        assert!(credential.token_hash.is_none());
        assert!(credential.is_live_at(Utc::now()));
    }

    #[test]
    fn test_credential_expiry_is_inclusive() {
        let credential = sample_credential(TokenClass::Access);

        assert!(credential.is_expired_at(credential.expires_at));
        assert!(!credential.is_live_at(credential.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_claims_carry_credential_identity() {
        let owner = Owner::new("ops@agency.test", Role::Staff);
        let mut credential = sample_credential(TokenClass::Access);
        credential.owner_id = owner.id;

        let claims = Claims::for_credential(&owner, &credential, "iss", "aud");

        assert_eq!(claims.owner_id().unwrap(), owner.id);
        assert_eq!(claims.credential_id().unwrap(), credential.id);
        assert_eq!(claims.sv, 3);
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.exp, credential.expires_at.timestamp());
    }
}
