//! MySQL implementation of the CredentialRepository trait.
//!
//! Credentials live in the `auth_tokens` table. Every state change the token
//! lifecycle depends on is a single `UPDATE ... WHERE` statement whose
//! success is read from `rows_affected()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use std::str::FromStr;
use uuid::Uuid;

use agency_core::domain::entities::{Credential, NewCredential, TokenClass};
use agency_core::errors::DomainError;
use agency_core::repositories::{
    CredentialFilter, CredentialPatch, CredentialRepository, ExpectedState,
};

const CREDENTIAL_COLUMNS: &str = "id, owner_id, class, security_version, token_hash, issued_at, \
     expires_at, used, revoked_at, last_refreshed_at, refresh_count";

/// MySQL implementation of CredentialRepository
pub struct MySqlCredentialRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlCredentialRepository {
    /// Create a new MySQL credential repository
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to Credential entity
    fn row_to_credential(row: &MySqlRow) -> Result<Credential, DomainError> {
        let id: String = column(row, "id")?;
        let owner_id: String = column(row, "owner_id")?;
        let class: String = column(row, "class")?;

        Ok(Credential {
            id: parse_uuid(&id)?,
            owner_id: parse_uuid(&owner_id)?,
            class: TokenClass::from_str(&class)
                .map_err(|message| DomainError::Internal { message })?,
            security_version: column(row, "security_version")?,
            token_hash: column(row, "token_hash")?,
            issued_at: column(row, "issued_at")?,
            expires_at: column(row, "expires_at")?,
            used: column(row, "used")?,
            revoked_at: column(row, "revoked_at")?,
            last_refreshed_at: column(row, "last_refreshed_at")?,
            refresh_count: column(row, "refresh_count")?,
        })
    }

    async fn fetch_one_by(
        &self,
        key: &str,
        value: String,
    ) -> Result<Option<Credential>, DomainError> {
        let query = format!(
            "SELECT {} FROM auth_tokens WHERE {} = ? LIMIT 1",
            CREDENTIAL_COLUMNS, key
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("find credential"))?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }
}

/// Append the `SET` list for `patch`
fn push_patch(builder: &mut QueryBuilder<'_, MySql>, patch: &CredentialPatch) {
    let mut set = builder.separated(", ");
    if patch.mark_used {
        set.push("used = TRUE");
    }
    if patch.release {
        set.push("used = FALSE");
    }
    if let Some(at) = patch.revoked_at {
        set.push("revoked_at = ");
        set.push_bind_unseparated(at);
    }
    if let Some(at) = patch.refreshed_at {
        set.push("last_refreshed_at = ");
        set.push_bind_unseparated(at);
        set.push("refresh_count = refresh_count + 1");
    }
}

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(name).map_err(|e| DomainError::Internal {
        message: format!("Failed to get {}: {}", name, e),
    })
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID {}: {}", value, e),
    })
}

/// Every database failure surfaces as a retryable store outage
pub(crate) fn store_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        tracing::warn!(error = %e, action, "Credential store call failed");
        DomainError::StoreUnavailable {
            message: format!("Failed to {}: {}", action, e),
        }
    }
}

#[async_trait]
impl CredentialRepository for MySqlCredentialRepository {
    async fn create(&self, credential: NewCredential) -> Result<Credential, DomainError> {
        let credential = credential.into_credential(Uuid::new_v4());

        let query = r#"
            INSERT INTO auth_tokens (
                id, owner_id, class, security_version, issued_at, expires_at,
                used, refresh_count
            ) VALUES (?, ?, ?, ?, ?, ?, FALSE, 0)
        "#;

        sqlx::query(query)
            .bind(credential.id.to_string())
            .bind(credential.owner_id.to_string())
            .bind(credential.class.as_str())
            .bind(credential.security_version)
            .bind(credential.issued_at)
            .bind(credential.expires_at)
            .execute(&self.pool)
            .await
            .map_err(store_error("create credential"))?;

        Ok(credential)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, DomainError> {
        self.fetch_one_by("id", id.to_string()).await
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Credential>, DomainError> {
        self.fetch_one_by("token_hash", token_hash.to_string()).await
    }

    async fn attach_token_hash(&self, id: Uuid, token_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE auth_tokens SET token_hash = ? WHERE id = ?")
            .bind(token_hash)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error("attach token hash"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ExpectedState,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<MySql>::new("UPDATE auth_tokens SET ");
        push_patch(&mut builder, &patch);
        builder.push(" WHERE id = ").push_bind(id.to_string());
        builder.push(" AND used = ").push_bind(expected.used);
        builder.push(if expected.revoked {
            " AND revoked_at IS NOT NULL"
        } else {
            " AND revoked_at IS NULL"
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(store_error("update credential"))?;

        Ok(result.rows_affected())
    }

    async fn count_refreshed_since(
        &self,
        owner_id: Uuid,
        class: TokenClass,
        since: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let query = r#"
            SELECT COUNT(*) FROM auth_tokens
            WHERE owner_id = ? AND class = ? AND last_refreshed_at >= ?
        "#;

        let row = sqlx::query(query)
            .bind(owner_id.to_string())
            .bind(class.as_str())
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error("count refreshes"))?;

        let count: i64 = row.try_get(0).map_err(|e| DomainError::Internal {
            message: format!("Failed to read refresh count: {}", e),
        })?;
        Ok(count.max(0) as u64)
    }

    async fn update_many(
        &self,
        filter: &CredentialFilter,
        patch: CredentialPatch,
    ) -> Result<u64, DomainError> {
        if patch.is_empty() || filter.ids().map_or(false, |ids| ids.is_empty()) {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<MySql>::new("UPDATE auth_tokens SET ");
        push_patch(&mut builder, &patch);
        builder
            .push(" WHERE owner_id = ")
            .push_bind(filter.owner_id().to_string());
        builder.push(" AND revoked_at IS NULL");

        if let Some(ids) = filter.ids() {
            builder.push(" AND id IN (");
            let mut list = builder.separated(", ");
            for id in ids {
                list.push_bind(id.to_string());
            }
            list.push_unseparated(")");
        }
        if let Some(except_id) = filter.except_id() {
            builder.push(" AND id <> ").push_bind(except_id.to_string());
        }
        if let Some(class) = filter.class() {
            builder.push(" AND class = ").push_bind(class.as_str());
        }

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(store_error("bulk update credentials"))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_set_list() {
        let now = Utc::now();
        let mut builder = QueryBuilder::<MySql>::new("UPDATE auth_tokens SET ");
        push_patch(&mut builder, &CredentialPatch::rotate(now));

        assert_eq!(
            builder.sql(),
            "UPDATE auth_tokens SET used = TRUE, last_refreshed_at = ?, refresh_count = refresh_count + 1"
        );
    }

    #[test]
    fn test_revoke_patch_set_list() {
        let mut builder = QueryBuilder::<MySql>::new("UPDATE auth_tokens SET ");
        push_patch(&mut builder, &CredentialPatch::revoke(Utc::now()));

        assert_eq!(builder.sql(), "UPDATE auth_tokens SET revoked_at = ?");
    }

    #[test]
    fn test_release_patch_set_list() {
        let mut builder = QueryBuilder::<MySql>::new("UPDATE auth_tokens SET ");
        push_patch(&mut builder, &CredentialPatch::release());

        assert_eq!(builder.sql(), "UPDATE auth_tokens SET used = FALSE");
    }

    #[test]
    fn test_store_error_is_retryable() {
        let error = store_error("find credential")(sqlx::Error::PoolTimedOut);
        assert!(error.is_retryable());
        assert!(!error.is_authentication_failure());
    }
}
