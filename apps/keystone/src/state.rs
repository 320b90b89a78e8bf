//! # Application State
//!
//! What every command needs: the database handle and the loaded config.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is safe to share. The config is
//! read-only after startup and sits behind an `Arc`, so `AppState` is cheap
//! to clone into concurrent tasks.

use std::sync::Arc;

use keystone_db::{Database, DbConfig};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wraps an already opened database.
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    /// Opens (and migrates) the configured database.
    ///
    /// Creates the parent directory of the database file if needed.
    pub async fn open(config: AppConfig) -> ApiResult<Self> {
        let path = config.database_path();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::internal(format!(
                    "Cannot create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!(path = %path.display(), "Opening database");

        let db = Database::new(
            DbConfig::new(path).max_connections(config.database.max_connections),
        )
        .await?;

        Ok(AppState::new(db, config))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh state over an in-memory database.
    pub(crate) async fn memory_state(config: AppConfig) -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, config)
    }

    #[tokio::test]
    async fn test_memory_state_is_healthy() {
        let state = memory_state(AppConfig::default()).await;
        assert!(state.db.health_check().await);
        assert_eq!(state.config.orders.number_prefix, "SO");
    }

    #[tokio::test]
    async fn test_open_creates_data_directory() {
        let dir = std::env::temp_dir().join(format!(
            "keystone-state-{}",
            uuid::Uuid::new_v4()
        ));
        let mut config = AppConfig::default();
        config.database.path = Some(dir.join("nested").join("keystone.db"));

        let state = AppState::open(config).await.unwrap();
        assert!(state.db.health_check().await);
        assert!(dir.join("nested").exists());

        state.db.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }
}
