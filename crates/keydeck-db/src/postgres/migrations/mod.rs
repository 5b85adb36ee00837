use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Fixed key for the advisory lock that serialises migration runs
/// across processes sharing one database.
const MIGRATION_LOCK_KEY: i64 = 0x6B65_7964_6563_6B00; // "keydeck\0"

/// Advisory locks belong to a session, so the lock, the migrations and the
/// unlock all run on one connection taken from the pool.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    let result = run_inner(&mut conn).await;

    // Release even when a migration failed.
    let unlocked: Result<bool, _> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await;
    if !matches!(unlocked, Ok(true)) {
        tracing::warn!("failed to release migration lock: {unlocked:?}");
    }

    result
}

async fn run_inner(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__api_keys.sql"))
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
        tracing::info!("applied postgres migration v1");
    }

    Ok(())
}
