//! Refresh token rotation with abuse detection

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::TokenClass;
use crate::domain::value_objects::TokenPair;
use crate::errors::{AuthError, DomainError, DomainResult, FailureReason};
use crate::repositories::{CredentialPatch, CredentialRepository, ExpectedState, OwnerRepository};

use super::config::TokenServiceConfig;
use super::issuer::TokenIssuer;
use super::revocation::{RevocationService, RevokeRequest};
use super::verifier::TokenVerifier;

/// Exchanges a refresh token for a new access/refresh pair.
///
/// The new pair is issued before the old token is consumed. Consuming is a
/// single conditional update, so of several concurrent exchanges of the same
/// token exactly one wins; the losers revoke the pair they issued.
///
/// The refresh window is checked before issuing and counted again after a
/// successful claim, so concurrent rotations of different sessions of one
/// owner cannot slip past the limit together.
pub struct RotationController<C: CredentialRepository, O: OwnerRepository> {
    credentials: Arc<C>,
    verifier: Arc<TokenVerifier<C, O>>,
    issuer: Arc<TokenIssuer<C>>,
    revocation: Arc<RevocationService<C>>,
    config: TokenServiceConfig,
}

impl<C: CredentialRepository, O: OwnerRepository> RotationController<C, O> {
    pub fn new(
        credentials: Arc<C>,
        verifier: Arc<TokenVerifier<C, O>>,
        issuer: Arc<TokenIssuer<C>>,
        revocation: Arc<RevocationService<C>>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            credentials,
            verifier,
            issuer,
            revocation,
            config,
        }
    }

    /// Rotates `refresh_token`
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - New access and refresh tokens
    /// * `Err(AuthError::AuthenticationFailed)` - Token invalid or already exchanged
    /// * `Err(AuthError::SuspiciousActivityDetected)` - Too many recent refreshes;
    ///   every credential of the owner has been revoked
    pub async fn rotate(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let verified = self.verifier.verify(refresh_token, TokenClass::Refresh).await?;
        let owner = verified.owner;
        let old_id = verified.credential.id;

        let now = Utc::now();
        let window_start = now - self.config.refresh_window;
        let recent_refreshes = self
            .credentials
            .count_refreshed_since(owner.id, TokenClass::Refresh, window_start)
            .await?;

        if recent_refreshes + 1 > self.config.max_refreshes_per_window {
            return Err(self.flag_abuse(owner.id, recent_refreshes).await);
        }

        let access = self.issuer.issue(&owner, TokenClass::Access).await?;
        let refresh = match self.issuer.issue(&owner, TokenClass::Refresh).await {
            Ok(refresh) => refresh,
            Err(e) => {
                self.issuer.abandon(owner.id, vec![access.credential_id]).await;
                return Err(e);
            }
        };
        let issued = vec![access.credential_id, refresh.credential_id];

        let claimed = self
            .credentials
            .conditional_update(old_id, ExpectedState::live(), CredentialPatch::rotate(now))
            .await;

        match claimed {
            Ok(0) => {
                self.issuer.abandon(owner.id, issued).await;
                let reason = match self.credentials.find_by_id(old_id).await {
                    Ok(Some(old)) if old.is_revoked() && !old.used => FailureReason::Revoked,
                    _ => FailureReason::AlreadyUsed,
                };
                info!(
                    owner_id = %owner.id,
                    credential_id = %old_id,
                    reason = %reason,
                    "Lost refresh race, discarding new pair"
                );
                Err(DomainError::authentication_failed(reason))
            }
            Ok(_) => {
                // Includes this rotation
                let counted = self
                    .credentials
                    .count_refreshed_since(owner.id, TokenClass::Refresh, window_start)
                    .await;
                match counted {
                    Ok(count) if count > self.config.max_refreshes_per_window => {
                        return Err(self.flag_abuse(owner.id, count - 1).await);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(owner_id = %owner.id, error = %e, "Failed to recount refresh window");
                    }
                }

                info!(
                    owner_id = %owner.id,
                    old_credential_id = %old_id,
                    new_credential_id = %refresh.credential_id,
                    "Refresh token rotated"
                );
                Ok(TokenPair::new(access, refresh))
            }
            Err(e) => {
                warn!(owner_id = %owner.id, error = %e, "Failed to consume refresh token");
                self.issuer.abandon(owner.id, issued).await;
                Err(e)
            }
        }
    }

    /// Revokes every credential of the owner and builds the rejection
    async fn flag_abuse(&self, owner_id: Uuid, recent_refreshes: u64) -> DomainError {
        match self.revocation.revoke(owner_id, RevokeRequest::all()).await {
            Ok(revoked) => error!(
                owner_id = %owner_id,
                recent_refreshes = recent_refreshes,
                revoked = revoked,
                "Refresh rate exceeded, all sessions revoked"
            ),
            Err(e) => return e,
        }

        AuthError::SuspiciousActivityDetected {
            owner_id,
            recent_refreshes,
        }
        .into()
    }
}
