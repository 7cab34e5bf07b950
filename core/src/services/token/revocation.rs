//! Owner-scoped credential revocation

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::repositories::{CredentialFilter, CredentialPatch, CredentialRepository};

/// What to revoke. Exactly one of `token_ids` and `all` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokeRequest {
    /// Revoke only these credentials
    pub token_ids: Option<Vec<Uuid>>,

    /// Revoke every credential of the owner
    pub all: bool,

    /// Leave this credential untouched
    pub except_id: Option<Uuid>,
}

impl RevokeRequest {
    /// Every credential of the owner
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    /// The listed credentials
    pub fn tokens(ids: Vec<Uuid>) -> Self {
        Self {
            token_ids: Some(ids),
            ..Default::default()
        }
    }

    pub fn except(mut self, id: Uuid) -> Self {
        self.except_id = Some(id);
        self
    }
}

/// Revokes credentials belonging to one owner
pub struct RevocationService<C: CredentialRepository> {
    credentials: Arc<C>,
}

impl<C: CredentialRepository> RevocationService<C> {
    pub fn new(credentials: Arc<C>) -> Self {
        Self { credentials }
    }

    /// Revokes the credentials selected by `request` for `owner_id`
    ///
    /// Only credentials owned by `owner_id` and not already revoked are
    /// touched, so repeating a call returns 0.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of credentials newly revoked
    /// * `Err(DomainError::InvalidArgument)` - Neither or both selectors set
    pub async fn revoke(&self, owner_id: Uuid, request: RevokeRequest) -> DomainResult<u64> {
        let filter = match (request.token_ids, request.all) {
            (Some(ids), false) => {
                if ids.is_empty() {
                    return Ok(0);
                }
                CredentialFilter::owner(owner_id).with_ids(ids)
            }
            (None, true) => CredentialFilter::owner(owner_id),
            _ => {
                return Err(DomainError::InvalidArgument {
                    message: "exactly one of token_ids or all must be supplied".to_string(),
                })
            }
        };
        let filter = match request.except_id {
            Some(id) => filter.except(id),
            None => filter,
        };

        let revoked = self
            .credentials
            .update_many(&filter, CredentialPatch::revoke(Utc::now()))
            .await?;

        info!(
            owner_id = %owner_id,
            revoked = revoked,
            all = filter.ids().is_none(),
            "Credentials revoked"
        );
        Ok(revoked)
    }
}
