//! MySQL implementation of the OwnerRepository trait.
//!
//! Reads the `users` table maintained by the account module. Only the
//! security version is written from here.

use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use agency_core::domain::entities::{Owner, OwnerStatus, Role};
use agency_core::errors::DomainError;
use agency_core::repositories::OwnerRepository;

use super::credential_repository::store_error;

/// MySQL implementation of OwnerRepository
pub struct MySqlOwnerRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlOwnerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_owner(row: &MySqlRow) -> Result<Owner, DomainError> {
        let internal = |e: String| DomainError::Internal { message: e };

        let id: String = row.try_get("id").map_err(|e| internal(e.to_string()))?;
        let role: String = row.try_get("role").map_err(|e| internal(e.to_string()))?;
        let status: String = row.try_get("status").map_err(|e| internal(e.to_string()))?;

        Ok(Owner {
            id: Uuid::parse_str(&id).map_err(|e| internal(format!("Invalid owner UUID: {}", e)))?,
            email: row.try_get("email").map_err(|e| internal(e.to_string()))?,
            role: Role::from_str(&role).map_err(internal)?,
            status: OwnerStatus::from_str(&status).map_err(internal)?,
            security_version: row
                .try_get("security_version")
                .map_err(|e| internal(e.to_string()))?,
        })
    }
}

#[async_trait]
impl OwnerRepository for MySqlOwnerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Owner>, DomainError> {
        let query = r#"
            SELECT id, email, role, status, security_version
            FROM users
            WHERE id = ?
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find owner"))?;

        row.as_ref().map(Self::row_to_owner).transpose()
    }

    async fn increment_security_version(&self, id: Uuid) -> Result<i64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(store_error("begin transaction"))?;

        let updated = sqlx::query(
            "UPDATE users SET security_version = security_version + 1 WHERE id = ?",
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(store_error("bump security version"))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                resource: format!("owner {}", id),
            });
        }

        let row = sqlx::query("SELECT security_version FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(store_error("read security version"))?;

        tx.commit().await.map_err(store_error("commit transaction"))?;

        row.try_get("security_version")
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to get security_version: {}", e),
            })
    }
}
