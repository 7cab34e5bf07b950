//! Credential verification

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::entities::{Claims, Credential, Owner, TokenClass};
use crate::domain::value_objects::AuthenticatedOwner;
use crate::errors::{DomainError, DomainResult, FailureReason, TokenError};
use crate::repositories::{CredentialRepository, OwnerRepository};

use super::codec::TokenCodec;

/// A token that passed every check, with the records it was checked against
#[derive(Debug, Clone)]
pub struct VerifiedCredential {
    pub claims: Claims,
    pub credential: Credential,
    pub owner: Owner,
}

impl From<VerifiedCredential> for AuthenticatedOwner {
    fn from(verified: VerifiedCredential) -> Self {
        Self {
            owner_id: verified.owner.id,
            email: verified.owner.email,
            role: verified.owner.role,
            credential_id: verified.credential.id,
        }
    }
}

/// Validates a presented token against its record and its owner.
///
/// Checks run in a fixed order and the first failure wins:
/// decode, record exists, unused, unrevoked, unexpired, owner's security
/// version, owner active, record matches the claims.
pub struct TokenVerifier<C: CredentialRepository, O: OwnerRepository> {
    credentials: Arc<C>,
    owners: Arc<O>,
    codec: Arc<TokenCodec>,
}

impl<C: CredentialRepository, O: OwnerRepository> TokenVerifier<C, O> {
    pub fn new(credentials: Arc<C>, owners: Arc<O>, codec: Arc<TokenCodec>) -> Self {
        Self {
            credentials,
            owners,
            codec,
        }
    }

    /// Verifies `token` as a credential of class `expected`
    ///
    /// # Returns
    ///
    /// * `Ok(VerifiedCredential)` - Token is valid right now
    /// * `Err(DomainError::Auth)` - Token rejected, see `FailureReason`
    /// * `Err(DomainError)` - Store or configuration failure
    pub async fn verify(
        &self,
        token: &str,
        expected: TokenClass,
    ) -> DomainResult<VerifiedCredential> {
        let claims = self
            .codec
            .decode(token, expected)
            .map_err(|e| decode_failure(e, expected))?;

        let credential_id = claims
            .credential_id()
            .map_err(|_| reject(expected, FailureReason::InvalidCredentials))?;

        let credential = self
            .credentials
            .find_by_id(credential_id)
            .await?
            .ok_or_else(|| reject(expected, FailureReason::NotFound))?;

        if credential.used {
            return Err(reject(expected, FailureReason::AlreadyUsed));
        }
        if credential.is_revoked() {
            return Err(reject(expected, FailureReason::Revoked));
        }
        if credential.is_expired_at(Utc::now()) {
            return Err(reject(expected, FailureReason::Expired));
        }

        let owner = self
            .owners
            .find_by_id(credential.owner_id)
            .await?
            .ok_or_else(|| reject(expected, FailureReason::NotFound))?;

        if owner.security_version > claims.sv {
            return Err(reject(expected, FailureReason::SecurityVersionStale));
        }
        if !owner.is_active() {
            return Err(reject(expected, FailureReason::OwnerInactive));
        }

        let claimed_owner = claims.owner_id().ok();
        if credential.class != expected || claimed_owner != Some(credential.owner_id) {
            return Err(reject(expected, FailureReason::InvalidCredentials));
        }

        Ok(VerifiedCredential {
            claims,
            credential,
            owner,
        })
    }
}

fn reject(class: TokenClass, reason: FailureReason) -> DomainError {
    debug!(class = %class, reason = %reason, "Credential rejected");
    DomainError::authentication_failed(reason)
}

fn decode_failure(error: TokenError, class: TokenClass) -> DomainError {
    match error.failure_reason() {
        Some(reason) => reject(class, reason),
        None => DomainError::Token(error),
    }
}
