//! # Infrastructure Layer
//!
//! Concrete implementations behind the session core:
//! - **Database**: MySQL credential and owner repositories using SQLx
//! - **Telemetry**: tracing subscriber setup
//!
//! `initialize` loads nothing by itself; pass it the output of
//! `load_config` (or any hand-built `AppConfig`) to get a ready
//! `SessionService` backed by MySQL.

use std::sync::Arc;

use agency_core::services::token::{KeyRing, SessionService, TokenServiceConfig};
use agency_shared::config::{AppConfig, Environment};

pub mod database;
pub mod telemetry;

use database::{DatabasePool, MySqlCredentialRepository, MySqlOwnerRepository};

/// Session service backed by the MySQL repositories
pub type MySqlSessionService = SessionService<MySqlCredentialRepository, MySqlOwnerRepository>;

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Shared database pool
    pub pool: DatabasePool,
    /// Token lifecycle entry point
    pub sessions: Arc<MySqlSessionService>,
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - Tracing subscriber
/// - Database connection pool and migrations
/// - Signing keys and the session service
///
/// Fails with `InfrastructureError::Config` when signing keys are missing
/// outside development.
pub async fn initialize(config: AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    if let Err(e) = telemetry::init_tracing(&config.logging) {
        tracing::debug!(error = %e, "Keeping existing tracing subscriber");
    }

    tracing::info!(environment = %config.environment, "Initializing infrastructure services...");

    let keys = KeyRing::from_config(&config.auth.keys, config.environment)
        .map_err(|e| InfrastructureError::Config(e.to_string()))?;

    let pool = DatabasePool::new(config.database.clone()).await?;
    if !pool.health_check().await? {
        return Err(InfrastructureError::Config(
            "Database health check returned an unexpected value".to_string(),
        ));
    }
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }

    let credentials = Arc::new(MySqlCredentialRepository::new(pool.get_pool().clone()));
    let owners = Arc::new(MySqlOwnerRepository::new(pool.get_pool().clone()));
    let sessions = SessionService::new(
        credentials,
        owners,
        keys,
        TokenServiceConfig::from(&config.auth),
    );

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        pool,
        sessions: Arc::new(sessions),
    })
}

/// Load application configuration
///
/// Sources, later ones winning:
/// 1. Built-in baseline for the detected environment
/// 2. Optional `config.<environment>` file in the working directory
/// 3. `AGENCY__*` environment variables (`AGENCY__AUTH__KEYS__ACCESS_SECRET`)
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let environment = Environment::from_env();
    build_config(environment, config::Environment::with_prefix("AGENCY").separator("__"))
}

fn build_config(
    environment: Environment,
    overrides: config::Environment,
) -> Result<AppConfig, InfrastructureError> {
    let baseline = config::Config::try_from(&AppConfig::for_environment(environment))
        .map_err(|e| InfrastructureError::Config(format!("Failed to build defaults: {}", e)))?;

    let config = config::Config::builder()
        .add_source(baseline)
        .add_source(config::File::with_name(environment.config_file()).required(false))
        .add_source(overrides.try_parsing(true))
        .build()
        .map_err(|e| InfrastructureError::Config(format!("Failed to build config: {}", e)))?;

    config
        .try_deserialize()
        .map_err(|e| InfrastructureError::Config(format!("Failed to deserialize config: {}", e)))
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("AGENCY")
            .separator("__")
            .source(Some(source))
    }

    #[test]
    fn test_baseline_follows_environment() {
        let config = build_config(Environment::Production, overrides(&[])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database.max_connections, 50);
        assert!(!config.auth.keys.missing().is_empty());
    }

    #[test]
    fn test_environment_variables_override_baseline() {
        let config = build_config(
            Environment::Development,
            overrides(&[
                ("AGENCY__AUTH__KEYS__ACCESS_SECRET", "from-env"),
                ("AGENCY__DATABASE__MAX_CONNECTIONS", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.auth.keys.access_secret, "from-env");
        assert_eq!(config.database.max_connections, 7);
    }

    #[test]
    fn test_error_display() {
        let error = InfrastructureError::Migration("checksum mismatch".to_string());
        assert_eq!(error.to_string(), "Migration error: checksum mismatch");

        let error = InfrastructureError::Config("missing key".to_string());
        assert_eq!(error.to_string(), "Configuration error: missing key");
    }
}
