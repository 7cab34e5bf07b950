//! Session service: the surface the HTTP layer calls into

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::{Owner, TokenClass};
use crate::domain::value_objects::{AuthenticatedOwner, IssuedToken, TokenPair};
use crate::errors::{DomainError, DomainResult, FailureReason};
use crate::repositories::{CredentialPatch, CredentialRepository, ExpectedState, OwnerRepository};

use super::codec::{fingerprint, TokenCodec};
use super::config::TokenServiceConfig;
use super::issuer::TokenIssuer;
use super::key_manager::KeyRing;
use super::revocation::{RevocationService, RevokeRequest};
use super::rotation::RotationController;
use super::verifier::{TokenVerifier, VerifiedCredential};

/// Service wiring the token lifecycle components together
pub struct SessionService<C: CredentialRepository, O: OwnerRepository> {
    credentials: Arc<C>,
    owners: Arc<O>,
    issuer: Arc<TokenIssuer<C>>,
    verifier: Arc<TokenVerifier<C, O>>,
    revocation: Arc<RevocationService<C>>,
    rotation: RotationController<C, O>,
}

impl<C: CredentialRepository, O: OwnerRepository> SessionService<C, O> {
    /// Creates a new session service instance
    ///
    /// # Arguments
    ///
    /// * `credentials` - Credential store
    /// * `owners` - Owner directory
    /// * `keys` - Per-class signing keys
    /// * `config` - Lifetimes, issuer/audience and abuse limits
    ///
    /// # Returns
    ///
    /// A new `SessionService` instance
    pub fn new(
        credentials: Arc<C>,
        owners: Arc<O>,
        keys: KeyRing,
        config: TokenServiceConfig,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(keys, &config.issuer, &config.audience));
        let issuer = Arc::new(TokenIssuer::new(
            credentials.clone(),
            codec.clone(),
            config.clone(),
        ));
        let verifier = Arc::new(TokenVerifier::new(
            credentials.clone(),
            owners.clone(),
            codec,
        ));
        let revocation = Arc::new(RevocationService::new(credentials.clone()));
        let rotation = RotationController::new(
            credentials.clone(),
            verifier.clone(),
            issuer.clone(),
            revocation.clone(),
            config,
        );

        Self {
            credentials,
            owners,
            issuer,
            verifier,
            revocation,
            rotation,
        }
    }

    /// Verifier used by request middleware
    pub fn verifier(&self) -> &TokenVerifier<C, O> {
        &self.verifier
    }

    /// Issues a fresh access/refresh pair for an owner whose password was
    /// already checked by the caller
    pub async fn login(&self, owner_id: Uuid) -> DomainResult<TokenPair> {
        let owner = self.active_owner(owner_id).await?;

        let access = self.issuer.issue(&owner, TokenClass::Access).await?;
        let refresh = match self.issuer.issue(&owner, TokenClass::Refresh).await {
            Ok(refresh) => refresh,
            Err(e) => {
                self.issuer.abandon(owner.id, vec![access.credential_id]).await;
                return Err(e);
            }
        };

        info!(owner_id = %owner.id, "Session started");
        Ok(TokenPair::new(access, refresh))
    }

    /// Exchanges a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        self.rotation.rotate(refresh_token).await
    }

    /// Verifies an access token presented on a protected request
    pub async fn authenticate(&self, access_token: &str) -> DomainResult<AuthenticatedOwner> {
        let verified = self.verifier.verify(access_token, TokenClass::Access).await?;
        Ok(verified.into())
    }

    /// Revokes credentials of `owner_id`
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Authenticated owner
    /// * `request` - Which credentials to revoke
    /// * `current_access_token` - When set, the credential behind this token
    ///   survives the revocation. The token must verify as one of the owner's
    ///   access tokens, otherwise nothing is revoked.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of credentials newly revoked
    pub async fn revoke(
        &self,
        owner_id: Uuid,
        request: RevokeRequest,
        current_access_token: Option<&str>,
    ) -> DomainResult<u64> {
        let request = match current_access_token {
            Some(token) => {
                let current = self.verifier.verify(token, TokenClass::Access).await?;
                if current.owner.id != owner_id {
                    warn!(
                        owner_id = %owner_id,
                        token_owner_id = %current.owner.id,
                        "Current session token belongs to another owner"
                    );
                    return Err(DomainError::authentication_failed(
                        FailureReason::InvalidCredentials,
                    ));
                }
                request.except(current.credential.id)
            }
            None => request,
        };

        self.revocation.revoke(owner_id, request).await
    }

    /// Revokes the credential behind `refresh_token`
    ///
    /// The token is located by its fingerprint, so a token whose embedded
    /// expiry has passed can still be logged out.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The credential was revoked by this call
    /// * `Ok(false)` - Unknown token, or already revoked
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<bool> {
        let credential = match self
            .credentials
            .find_by_token_hash(&fingerprint(refresh_token))
            .await?
        {
            Some(credential) if credential.class == TokenClass::Refresh => credential,
            _ => return Ok(false),
        };

        let revoked = self
            .revocation
            .revoke(credential.owner_id, RevokeRequest::tokens(vec![credential.id]))
            .await?;
        Ok(revoked > 0)
    }

    /// Invalidates every credential issued so far by bumping the owner's
    /// security version
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - The new security version
    pub async fn sign_out_everywhere(&self, owner_id: Uuid) -> DomainResult<i64> {
        let version = self.owners.increment_security_version(owner_id).await?;
        info!(owner_id = %owner_id, security_version = version, "Signed out everywhere");
        Ok(version)
    }

    /// Issues a password reset token
    pub async fn issue_password_reset(&self, owner_id: Uuid) -> DomainResult<IssuedToken> {
        let owner = self.active_owner(owner_id).await?;
        self.issuer.issue(&owner, TokenClass::PasswordReset).await
    }

    /// Issues an email verification token
    pub async fn issue_email_verification(&self, owner_id: Uuid) -> DomainResult<IssuedToken> {
        let owner = self.active_owner(owner_id).await?;
        self.issuer.issue(&owner, TokenClass::EmailVerification).await
    }

    /// Consumes a password reset token and invalidates every older credential
    ///
    /// The caller stores the new password hash once this returns. When the
    /// security version cannot be bumped the token is released again, so the
    /// same token can be retried.
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - Owner whose password may now be replaced
    pub async fn complete_password_reset(&self, token: &str) -> DomainResult<Uuid> {
        let verified = self.consume(token, TokenClass::PasswordReset).await?;
        let owner_id = verified.owner.id;

        let version = match self.owners.increment_security_version(owner_id).await {
            Ok(version) => version,
            Err(e) => {
                warn!(owner_id = %owner_id, error = %e, "Failed to bump security version");
                self.release(verified.credential.id).await;
                return Err(e);
            }
        };

        info!(
            owner_id = %owner_id,
            security_version = version,
            "Password reset completed"
        );
        Ok(owner_id)
    }

    /// Consumes an email verification token
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - Owner whose email is confirmed
    pub async fn confirm_email(&self, token: &str) -> DomainResult<Uuid> {
        let verified = self.consume(token, TokenClass::EmailVerification).await?;
        info!(owner_id = %verified.owner.id, "Email confirmed");
        Ok(verified.owner.id)
    }

    async fn consume(&self, token: &str, class: TokenClass) -> DomainResult<VerifiedCredential> {
        if !class.is_single_use() {
            return Err(DomainError::InvalidArgument {
                message: format!("{} tokens cannot be consumed", class),
            });
        }

        let verified = self.verifier.verify(token, class).await?;
        let consumed = self
            .credentials
            .conditional_update(
                verified.credential.id,
                ExpectedState::live(),
                CredentialPatch::consume(),
            )
            .await?;

        if consumed == 0 {
            return Err(DomainError::authentication_failed(FailureReason::AlreadyUsed));
        }
        Ok(verified)
    }

    /// Best effort; a credential that stays consumed only forces a new request
    async fn release(&self, credential_id: Uuid) {
        let released = self
            .credentials
            .conditional_update(
                credential_id,
                ExpectedState::consumed(),
                CredentialPatch::release(),
            )
            .await;

        if let Err(e) = released {
            warn!(credential_id = %credential_id, error = %e, "Failed to release consumed credential");
        }
    }

    async fn active_owner(&self, owner_id: Uuid) -> DomainResult<Owner> {
        let owner = self
            .owners
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| DomainError::authentication_failed(FailureReason::InvalidCredentials))?;

        if !owner.is_active() {
            return Err(DomainError::authentication_failed(FailureReason::OwnerInactive));
        }
        Ok(owner)
    }
}
