//! Credential repository trait defining the interface for credential persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{Credential, NewCredential, TokenClass};
use crate::errors::DomainError;

/// State a credential must be in for a conditional update to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub used: bool,
    pub revoked: bool,
}

impl ExpectedState {
    /// Unused and not revoked
    pub const fn live() -> Self {
        Self {
            used: false,
            revoked: false,
        }
    }

    /// Used but not revoked
    pub const fn consumed() -> Self {
        Self {
            used: true,
            revoked: false,
        }
    }

    pub fn matches(&self, credential: &Credential) -> bool {
        credential.used == self.used && credential.is_revoked() == self.revoked
    }
}

/// Changes applied to matching credentials. Fields left `None`/`false`
/// leave the column untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialPatch {
    /// Set `used = true`
    pub mark_used: bool,

    /// Set `used = false`
    pub release: bool,

    /// Set `revoked_at`
    pub revoked_at: Option<DateTime<Utc>>,

    /// Set `last_refreshed_at` and increment `refresh_count`
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl CredentialPatch {
    pub fn revoke(at: DateTime<Utc>) -> Self {
        Self {
            revoked_at: Some(at),
            ..Default::default()
        }
    }

    /// Consume a single-use credential
    pub fn consume() -> Self {
        Self {
            mark_used: true,
            ..Default::default()
        }
    }

    /// Undo `consume` when the step that followed it failed
    pub fn release() -> Self {
        Self {
            release: true,
            ..Default::default()
        }
    }

    /// Consume a refresh credential and record the exchange
    pub fn rotate(at: DateTime<Utc>) -> Self {
        Self {
            mark_used: true,
            refreshed_at: Some(at),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.mark_used && !self.release && self.revoked_at.is_none() && self.refreshed_at.is_none()
    }

    /// Apply the patch to an in-memory record
    pub fn apply(&self, credential: &mut Credential) {
        if self.mark_used {
            credential.used = true;
        }
        if self.release {
            credential.used = false;
        }
        if let Some(at) = self.revoked_at {
            credential.revoked_at = Some(at);
        }
        if let Some(at) = self.refreshed_at {
            credential.last_refreshed_at = Some(at);
            credential.refresh_count += 1;
        }
    }
}

/// Selects an owner's unrevoked credentials for a bulk update.
///
/// A filter can only be built for a single owner, so a bulk update can
/// never reach another owner's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFilter {
    owner_id: Uuid,
    ids: Option<Vec<Uuid>>,
    except_id: Option<Uuid>,
    class: Option<TokenClass>,
}

impl CredentialFilter {
    /// Every unrevoked credential of `owner_id`
    pub fn owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            ids: None,
            except_id: None,
            class: None,
        }
    }

    /// Restrict to the listed ids
    pub fn with_ids(mut self, ids: Vec<Uuid>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Leave one credential untouched
    pub fn except(mut self, id: Uuid) -> Self {
        self.except_id = Some(id);
        self
    }

    pub fn with_class(mut self, class: TokenClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn ids(&self) -> Option<&[Uuid]> {
        self.ids.as_deref()
    }

    pub fn except_id(&self) -> Option<Uuid> {
        self.except_id
    }

    pub fn class(&self) -> Option<TokenClass> {
        self.class
    }

    pub fn matches(&self, credential: &Credential) -> bool {
        credential.owner_id == self.owner_id
            && !credential.is_revoked()
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&credential.id))
            && self.except_id.map_or(true, |id| id != credential.id)
            && self.class.map_or(true, |class| class == credential.class)
    }
}

/// Repository trait for credential persistence
///
/// Every mutation the token lifecycle relies on for correctness is expressed
/// as a single conditional statement, so implementations must apply each call
/// atomically with respect to concurrent callers.
///
/// # Security Considerations
/// - Only SHA-256 fingerprints of signed tokens are stored
/// - Revocation is a timestamp, rows are never deleted by the lifecycle
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Insert a new credential and assign its id
    ///
    /// # Arguments
    /// * `credential` - Fields chosen by the issuer
    ///
    /// # Returns
    /// * `Ok(Credential)` - The stored record with its generated id
    /// * `Err(DomainError)` - Store failure
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use uuid::Uuid;
    /// # use agency_core::repositories::CredentialRepository;
    /// # use agency_core::domain::entities::{NewCredential, TokenClass};
    /// # async fn example(repo: &impl CredentialRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let now = Utc::now();
    /// let stored = repo
    ///     .create(NewCredential {
    ///         owner_id: Uuid::new_v4(),
    ///         class: TokenClass::Refresh,
    ///         security_version: 0,
    ///         issued_at: now,
    ///         expires_at: now + Duration::days(14),
    ///     })
    ///     .await?;
    /// println!("Credential stored with ID: {}", stored.id);
    /// # Ok(())
    /// # }
    /// ```
    async fn create(&self, credential: NewCredential) -> Result<Credential, DomainError>;

    /// Find a credential by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, DomainError>;

    /// Find a credential by the fingerprint of its signed token
    async fn find_by_token_hash(&self, token_hash: &str)
        -> Result<Option<Credential>, DomainError>;

    /// Record the fingerprint of the signed token
    ///
    /// # Returns
    /// * `Ok(true)` - Fingerprint stored
    /// * `Ok(false)` - No credential with that id
    async fn attach_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool, DomainError>;

    /// Apply `patch` to credential `id` only if it is currently in `expected`
    /// state. Check and write happen as one atomic step.
    ///
    /// # Returns
    /// * `Ok(1)` - The caller won the update
    /// * `Ok(0)` - The credential is missing or no longer in `expected` state
    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ExpectedState,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError>;

    /// Count an owner's credentials of `class` exchanged at or after `since`
    async fn count_refreshed_since(
        &self,
        owner_id: Uuid,
        class: TokenClass,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// Apply `patch` to every credential matched by `filter`
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of credentials changed
    async fn update_many(
        &self,
        filter: &CredentialFilter,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError>;
}
