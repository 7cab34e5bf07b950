//! In-memory implementation of CredentialRepository
//!
//! Used by tests and local tooling. Each trait call takes the map lock once,
//! which gives the same atomicity as the single-statement SQL updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Credential, NewCredential, TokenClass};
use crate::errors::DomainError;

use super::r#trait::{CredentialFilter, CredentialPatch, CredentialRepository, ExpectedState};

/// In-memory credential repository
pub struct InMemoryCredentialRepository {
    credentials: Arc<RwLock<HashMap<Uuid, Credential>>>,
    available: AtomicBool,
}

impl InMemoryCredentialRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            credentials: Arc::new(RwLock::new(HashMap::new())),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate a store outage; every call fails with `StoreUnavailable`
    /// while unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Mutate a stored credential directly, bypassing the lifecycle
    pub async fn edit<F>(&self, id: Uuid, edit: F) -> bool
    where
        F: FnOnce(&mut Credential),
    {
        let mut credentials = self.credentials.write().await;
        match credentials.get_mut(&id) {
            Some(credential) => {
                edit(credential);
                true
            }
            None => false,
        }
    }

    /// Current copy of a credential
    pub async fn snapshot(&self, id: Uuid) -> Option<Credential> {
        self.credentials.read().await.get(&id).cloned()
    }

    /// Every credential stored for an owner
    pub async fn owner_credentials(&self, owner_id: Uuid) -> Vec<Credential> {
        self.credentials
            .read()
            .await
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Credentials of an owner that would still pass the row checks now
    pub async fn live_count(&self, owner_id: Uuid) -> usize {
        let now = Utc::now();
        self.credentials
            .read()
            .await
            .values()
            .filter(|c| c.owner_id == owner_id && c.is_live_at(now))
            .count()
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    fn ensure_available(&self) -> Result<(), DomainError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::StoreUnavailable {
                message: "in-memory credential store is offline".to_string(),
            })
        }
    }
}

impl Default for InMemoryCredentialRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn create(&self, credential: NewCredential) -> Result<Credential, DomainError> {
        self.ensure_available()?;
        let mut credentials = self.credentials.write().await;

        let credential = credential.into_credential(Uuid::new_v4());
        credentials.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, DomainError> {
        self.ensure_available()?;
        Ok(self.credentials.read().await.get(&id).cloned())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Credential>, DomainError> {
        self.ensure_available()?;
        let credentials = self.credentials.read().await;
        Ok(credentials
            .values()
            .find(|c| c.token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn attach_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool, DomainError> {
        self.ensure_available()?;
        let mut credentials = self.credentials.write().await;
        match credentials.get_mut(&id) {
            Some(credential) => {
                credential.token_hash = Some(token_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ExpectedState,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError> {
        self.ensure_available()?;
        let mut credentials = self.credentials.write().await;
        match credentials.get_mut(&id) {
            Some(credential) if expected.matches(credential) => {
                patch.apply(credential);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn count_refreshed_since(
        &self,
        owner_id: Uuid,
        class: TokenClass,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        self.ensure_available()?;
        let credentials = self.credentials.read().await;
        let count = credentials
            .values()
            .filter(|c| {
                c.owner_id == owner_id
                    && c.class == class
                    && c.last_refreshed_at.map_or(false, |at| at >= since)
            })
            .count();
        Ok(count as u64)
    }

    async fn update_many(
        &self,
        filter: &CredentialFilter,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError> {
        self.ensure_available()?;
        if patch.is_empty() {
            return Ok(0);
        }

        let mut credentials = self.credentials.write().await;
        let mut updated = 0;
        for credential in credentials.values_mut().filter(|c| filter.matches(c)) {
            patch.apply(credential);
            updated += 1;
        }
        Ok(updated)
    }
}
