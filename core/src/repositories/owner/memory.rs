//! In-memory implementation of OwnerRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Owner, OwnerStatus};
use crate::errors::DomainError;

use super::r#trait::OwnerRepository;

/// In-memory owner directory
pub struct InMemoryOwnerRepository {
    owners: Arc<RwLock<HashMap<Uuid, Owner>>>,
    available: AtomicBool,
}

impl InMemoryOwnerRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            owners: Arc::new(RwLock::new(HashMap::new())),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate a directory outage
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Insert or replace an owner
    pub async fn insert(&self, owner: Owner) {
        self.owners.write().await.insert(owner.id, owner);
    }

    /// Change an owner's account status
    pub async fn set_status(&self, id: Uuid, status: OwnerStatus) -> bool {
        match self.owners.write().await.get_mut(&id) {
            Some(owner) => {
                owner.status = status;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<Owner> {
        self.owners.write().await.remove(&id)
    }

    fn ensure_available(&self) -> Result<(), DomainError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::StoreUnavailable {
                message: "in-memory owner directory is offline".to_string(),
            })
        }
    }
}

impl Default for InMemoryOwnerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OwnerRepository for InMemoryOwnerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Owner>, DomainError> {
        self.ensure_available()?;
        Ok(self.owners.read().await.get(&id).cloned())
    }

    async fn increment_security_version(&self, id: Uuid) -> Result<i64, DomainError> {
        self.ensure_available()?;
        let mut owners = self.owners.write().await;
        let owner = owners.get_mut(&id).ok_or_else(|| DomainError::NotFound {
            resource: format!("owner {}", id),
        })?;
        owner.security_version += 1;
        Ok(owner.security_version)
    }
}
