//! Owner repository trait.
//!
//! The owner directory is maintained elsewhere; the token lifecycle only
//! reads owners fresh on every verification and bumps their security version.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Owner;
use crate::errors::DomainError;

/// Repository trait for the owner fields the token lifecycle depends on
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use uuid::Uuid;
/// use agency_core::repositories::OwnerRepository;
/// use agency_core::domain::entities::Owner;
/// use agency_core::errors::DomainError;
///
/// struct DirectoryOwnerRepository {
///     // directory client
/// }
///
/// #[async_trait]
/// impl OwnerRepository for DirectoryOwnerRepository {
///     async fn find_by_id(&self, id: Uuid) -> Result<Option<Owner>, DomainError> {
///         // Implementation here
///         Ok(None)
///     }
///
///     async fn increment_security_version(&self, id: Uuid) -> Result<i64, DomainError> {
///         Err(DomainError::NotFound { resource: format!("owner {}", id) })
///     }
/// }
/// ```
#[async_trait]
pub trait OwnerRepository: Send + Sync {
    /// Find an owner by id
    ///
    /// # Returns
    /// * `Ok(Some(Owner))` - Owner found
    /// * `Ok(None)` - No such owner
    /// * `Err(DomainError)` - Store failure
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Owner>, DomainError>;

    /// Atomically increment the owner's security version
    ///
    /// # Returns
    /// * `Ok(i64)` - The new security version
    /// * `Err(DomainError::NotFound)` - No such owner
    async fn increment_security_version(&self, id: Uuid) -> Result<i64, DomainError>;
}
