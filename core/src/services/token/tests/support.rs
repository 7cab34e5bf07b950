//! Shared fixtures for the token service tests

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entities::{Claims, NewCredential, Owner, Role, TokenClass};
use crate::errors::{DomainError, FailureReason};
use crate::repositories::{
    CredentialRepository, InMemoryCredentialRepository, InMemoryOwnerRepository,
};
use crate::services::token::{
    fingerprint, KeyRing, SessionService, TokenCodec, TokenIssuer, TokenServiceConfig,
    TokenVerifier,
};

pub type Sessions = SessionService<InMemoryCredentialRepository, InMemoryOwnerRepository>;

/// Distinct secret per class
pub fn test_keys() -> KeyRing {
    KeyRing::empty()
        .with_secret(TokenClass::Access, "access-test-secret")
        .with_secret(TokenClass::Refresh, "refresh-test-secret")
        .with_secret(TokenClass::PasswordReset, "password-reset-test-secret")
        .with_secret(TokenClass::EmailVerification, "email-verification-test-secret")
}

/// Same secret for every class, so only the class claim tells tokens apart
pub fn shared_keys() -> KeyRing {
    TokenClass::ALL
        .iter()
        .fold(KeyRing::empty(), |ring, class| ring.with_secret(*class, "shared-test-secret"))
}

pub fn test_codec(keys: KeyRing) -> TokenCodec {
    let config = TokenServiceConfig::default();
    TokenCodec::new(keys, &config.issuer, &config.audience)
}

pub struct Harness {
    pub credentials: Arc<InMemoryCredentialRepository>,
    pub owners: Arc<InMemoryOwnerRepository>,
    pub sessions: Sessions,
    pub owner: Owner,
    pub keys: KeyRing,
    pub config: TokenServiceConfig,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(test_keys(), TokenServiceConfig::default()).await
    }

    pub async fn with(keys: KeyRing, config: TokenServiceConfig) -> Self {
        let credentials = Arc::new(InMemoryCredentialRepository::new());
        let owners = Arc::new(InMemoryOwnerRepository::new());
        let owner = Owner::new("staff@agency.test", Role::Staff);
        owners.insert(owner.clone()).await;

        let sessions = SessionService::new(
            credentials.clone(),
            owners.clone(),
            keys.clone(),
            config.clone(),
        );

        Self {
            credentials,
            owners,
            sessions,
            owner,
            keys,
            config,
        }
    }

    pub async fn add_owner(&self, email: &str, role: Role) -> Owner {
        let owner = Owner::new(email, role);
        self.owners.insert(owner.clone()).await;
        owner
    }

    pub fn codec(&self) -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(
            self.keys.clone(),
            &self.config.issuer,
            &self.config.audience,
        ))
    }

    pub fn issuer(&self) -> TokenIssuer<InMemoryCredentialRepository> {
        TokenIssuer::new(self.credentials.clone(), self.codec(), self.config.clone())
    }

    pub fn verifier(&self) -> TokenVerifier<InMemoryCredentialRepository, InMemoryOwnerRepository> {
        TokenVerifier::new(self.credentials.clone(), self.owners.clone(), self.codec())
    }

    /// Stores a refresh credential whose signed token already expired
    pub async fn expired_refresh_token(&self) -> (String, uuid::Uuid) {
        let issued_at = Utc::now() - Duration::days(15);
        let credential = self
            .credentials
            .create(NewCredential {
                owner_id: self.owner.id,
                class: TokenClass::Refresh,
                security_version: self.owner.security_version,
                issued_at,
                expires_at: issued_at + Duration::days(14),
            })
            .await
            .unwrap();
        let claims = Claims::for_credential(
            &self.owner,
            &credential,
            &self.config.issuer,
            &self.config.audience,
        );
        let token = self.codec().encode(&claims).unwrap();
        self.credentials
            .attach_token_hash(credential.id, &fingerprint(&token))
            .await
            .unwrap();
        (token, credential.id)
    }
}

/// Asserts the error is an authentication failure with `reason`
pub fn assert_rejected<T: std::fmt::Debug>(result: Result<T, DomainError>, reason: FailureReason) {
    match result {
        Err(error) => {
            assert!(error.is_authentication_failure(), "not an auth failure: {error:?}");
            assert_eq!(error.failure_reason(), Some(reason), "{error:?}");
        }
        Ok(value) => panic!("expected rejection with {reason}, got {value:?}"),
    }
}
