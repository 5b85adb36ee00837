use chrono::{DateTime, Utc};

use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

const COLUMNS: &str = "id, name, value, usage_count, max_usage, created_at";

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    id: String,
    name: String,
    value: String,
    usage_count: i64,
    max_usage: i64,
    created_at: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKeyRecord {
    fn from(r: ApiKeyRow) -> Self {
        ApiKeyRecord {
            id: r.id,
            name: r.name,
            value: r.value,
            usage_count: r.usage_count,
            max_usage: r.max_usage,
            created_at: r.created_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_list_api_keys(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, DbError> {
        // "C" collation pins byte-wise ordering to match SQLite's BINARY.
        let dir = order.as_sql();
        let sql = format!(
            "SELECT {COLUMNS} FROM api_keys WHERE user_id = $1
             ORDER BY name COLLATE \"C\" {dir}, id {dir}"
        );
        let rows = sqlx::query_as::<_, ApiKeyRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_get_api_key(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<ApiKeyRecord, DbError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {COLUMNS} FROM api_keys WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;

        row.map(|r| r.into())
            .ok_or_else(|| pg_not_found(&format!("api_key {id}")))
    }

    pub(crate) async fn pg_insert_api_key(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "INSERT INTO api_keys (id, user_id, name, value, usage_count, max_usage, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        ))
        .bind(&id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.value)
        .bind(input.usage_count)
        .bind(input.max_usage)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_update_api_key(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE api_keys SET
                name      = COALESCE($1, name),
                value     = COALESCE($2, value),
                max_usage = COALESCE($3, max_usage)
             WHERE id = $4 AND user_id = $5",
        )
        .bind(update.name.as_deref())
        .bind(update.value.as_deref())
        .bind(update.max_usage)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("api_key {id}")));
        }

        Ok(())
    }

    pub(crate) async fn pg_delete_api_key(&self, user_id: &str, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("api_key {id}")));
        }

        Ok(())
    }
}
