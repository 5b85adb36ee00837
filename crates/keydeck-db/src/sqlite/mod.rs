pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};
use rusqlite::Connection;

use crate::{Database, DbConfig, DbError};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("keydeck.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(|conn| migrations::run(conn))
    }
}

/// Map a `rusqlite::Error` into a `DbError::Internal`.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn list_api_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || db.list_api_keys_sync(&user_id, order))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
    async fn get_api_key(&self, user_id: &str, id: &str) -> Result<ApiKeyRecord, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.get_api_key_sync(&user_id, &id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
    async fn insert_api_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let input = input.clone();
        tokio::task::spawn_blocking(move || db.insert_api_key_sync(&user_id, &input))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
    async fn update_api_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let id = id.to_string();
        let update = update.clone();
        tokio::task::spawn_blocking(move || db.update_api_key_sync(&user_id, &id, &update))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
    async fn delete_api_key(&self, user_id: &str, id: &str) -> Result<(), DbError> {
        let db = self.clone();
        let user_id = user_id.to_string();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.delete_api_key_sync(&user_id, &id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}
