use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .to_db()?;

    if current_version < 1 {
        // v1: api_keys, scoped by user_id, listed by name
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS api_keys (
                id           TEXT PRIMARY KEY,
                user_id      TEXT NOT NULL,
                name         TEXT NOT NULL,
                value        TEXT NOT NULL,
                usage_count  INTEGER NOT NULL DEFAULT 0 CHECK(usage_count >= 0),
                max_usage    INTEGER NOT NULL,
                created_at   TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_api_keys_user_name
                ON api_keys(user_id, name);

            INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'));",
        )
        .to_db()?;
        tracing::info!("applied sqlite migration v1");
    }

    Ok(())
}
