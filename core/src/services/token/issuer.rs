//! Credential issuance

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::{Claims, Credential, NewCredential, Owner, TokenClass};
use crate::domain::value_objects::IssuedToken;
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{CredentialFilter, CredentialPatch, CredentialRepository};

use super::codec::{fingerprint, TokenCodec};
use super::config::TokenServiceConfig;

/// Creates the credential record first and signs a token bound to its id.
///
/// A token is only returned once its record exists with the fingerprint
/// attached. If signing or the fingerprint write fails, the half-built
/// record is revoked and the error is returned.
pub struct TokenIssuer<C: CredentialRepository> {
    credentials: Arc<C>,
    codec: Arc<TokenCodec>,
    config: TokenServiceConfig,
}

impl<C: CredentialRepository> TokenIssuer<C> {
    pub fn new(credentials: Arc<C>, codec: Arc<TokenCodec>, config: TokenServiceConfig) -> Self {
        Self {
            credentials,
            codec,
            config,
        }
    }

    /// Issues a credential of `class` for `owner`
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner as currently stored; its security version is embedded
    /// * `class` - Class of credential to issue
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedToken)` - Signed token and the id of its record
    /// * `Err(DomainError)` - Store or signing failure, nothing usable was issued
    pub async fn issue(&self, owner: &Owner, class: TokenClass) -> DomainResult<IssuedToken> {
        let issued_at = Utc::now();
        let credential = self
            .credentials
            .create(NewCredential {
                owner_id: owner.id,
                class,
                security_version: owner.security_version,
                issued_at,
                expires_at: issued_at + self.config.ttl(class),
            })
            .await?;

        let claims =
            Claims::for_credential(owner, &credential, &self.config.issuer, &self.config.audience);
        let token = match self.codec.encode(&claims) {
            Ok(token) => token,
            Err(e) => {
                self.discard(&credential).await;
                return Err(e.into());
            }
        };

        match self
            .credentials
            .attach_token_hash(credential.id, &fingerprint(&token))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return Err(DomainError::Internal {
                    message: format!("credential {} disappeared during issue", credential.id),
                });
            }
            Err(e) => {
                self.discard(&credential).await;
                return Err(e);
            }
        }

        debug!(
            owner_id = %owner.id,
            credential_id = %credential.id,
            class = %class,
            "Credential issued"
        );

        Ok(IssuedToken {
            token,
            credential_id: credential.id,
            class,
            expires_at: credential.expires_at,
        })
    }

    /// Revokes credentials that were issued but never handed out
    pub(crate) async fn abandon(&self, owner_id: Uuid, credential_ids: Vec<Uuid>) {
        let filter = CredentialFilter::owner(owner_id).with_ids(credential_ids);
        if let Err(e) = self
            .credentials
            .update_many(&filter, CredentialPatch::revoke(Utc::now()))
            .await
        {
            warn!(owner_id = %owner_id, error = %e, "Failed to revoke abandoned credentials");
        }
    }

    async fn discard(&self, credential: &Credential) {
        self.abandon(credential.owner_id, vec![credential.id]).await;
    }
}
