#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
use thiserror::Error;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the `api_keys` table lives.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// Postgres connection URL. Takes precedence when the `postgres` feature is enabled.
    pub database_url: Option<String>,
    /// SQLite file path. Defaults to `<data dir>/keydeck.db`.
    pub sqlite_path: Option<String>,
}

/// The record store. Every operation is scoped to a single `user_id`.
#[async_trait]
pub trait Database: Send + Sync {
    async fn list_api_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, DbError>;
    async fn get_api_key(&self, user_id: &str, id: &str) -> Result<ApiKeyRecord, DbError>;
    async fn insert_api_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, DbError>;
    async fn update_api_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), DbError>;
    async fn delete_api_key(&self, user_id: &str, id: &str) -> Result<(), DbError>;
}

/// Open the configured backend.
pub async fn open(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    #[cfg(feature = "postgres")]
    if let Some(ref url) = config.database_url {
        tracing::info!("using postgres backend");
        return Ok(Arc::new(PostgresDatabase::connect(url).await?));
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        Err(DbError::Internal(
            "no database backend available for this configuration".into(),
        ))
    }
}

pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("keydeck")
}
