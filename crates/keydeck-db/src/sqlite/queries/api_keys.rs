use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use keydeck_core::{ApiKeyRecord, NewApiKey, SortOrder, UpdateApiKey};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

const COLUMNS: &str = "id, name, value, usage_count, max_usage, created_at";

fn row_to_api_key(row: &Row) -> rusqlite::Result<ApiKeyRecord> {
    let created_at: DateTime<Utc> = row.get("created_at")?;
    Ok(ApiKeyRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        value: row.get("value")?,
        usage_count: row.get("usage_count")?,
        max_usage: row.get("max_usage")?,
        created_at,
    })
}

impl SqliteDatabase {
    pub fn list_api_keys_sync(
        &self,
        user_id: &str,
        order: SortOrder,
    ) -> Result<Vec<ApiKeyRecord>, DbError> {
        self.with_conn(|conn| {
            // BINARY collation: case-sensitive byte order.
            let dir = order.as_sql();
            let sql = format!(
                "SELECT {COLUMNS} FROM api_keys WHERE user_id = ?1
                 ORDER BY name COLLATE BINARY {dir}, id {dir}"
            );
            let mut stmt = conn.prepare(&sql).to_db()?;
            let keys = stmt
                .query_map(params![user_id], row_to_api_key)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(keys)
        })
    }

    pub fn get_api_key_sync(&self, user_id: &str, id: &str) -> Result<ApiKeyRecord, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM api_keys WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                row_to_api_key,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("api_key {id}"))
                }
                other => DbError::Internal(other.to_string()),
            })
        })
    }

    pub fn insert_api_key_sync(
        &self,
        user_id: &str,
        input: &NewApiKey,
    ) -> Result<ApiKeyRecord, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO api_keys (id, user_id, name, value, usage_count, max_usage, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    user_id,
                    input.name,
                    input.value,
                    input.usage_count,
                    input.max_usage,
                    now
                ],
            )
            .to_db()?;
            Ok(())
        })?;
        self.get_api_key_sync(user_id, &id)
    }

    pub fn update_api_key_sync(
        &self,
        user_id: &str,
        id: &str,
        update: &UpdateApiKey,
    ) -> Result<(), DbError> {
        if update.is_empty() {
            return self.get_api_key_sync(user_id, id).map(|_| ());
        }

        self.with_conn(|conn| {
            let mut sets = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(ref name) = update.name {
                sets.push("name = ?");
                values.push(Box::new(name.clone()));
            }
            if let Some(ref value) = update.value {
                sets.push("value = ?");
                values.push(Box::new(value.clone()));
            }
            if let Some(max_usage) = update.max_usage {
                sets.push("max_usage = ?");
                values.push(Box::new(max_usage));
            }

            values.push(Box::new(id.to_string()));
            values.push(Box::new(user_id.to_string()));
            let sql = format!(
                "UPDATE api_keys SET {} WHERE id = ? AND user_id = ?",
                sets.join(", ")
            );
            let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
            let changed = conn.execute(&sql, refs.as_slice()).to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("api_key {id}")));
            }
            Ok(())
        })
    }

    pub fn delete_api_key_sync(&self, user_id: &str, id: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM api_keys WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("api_key {id}")));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use keydeck_core::{NewApiKey, SortOrder, UpdateApiKey};

    use crate::{DbError, SqliteDatabase};

    const USER: &str = "dev-local";

    #[test]
    fn test_api_key_crud() {
        let db = SqliteDatabase::open_in_memory().unwrap();

        // Insert
        let key = db
            .insert_api_key_sync(USER, &NewApiKey::generate("Test", 10))
            .unwrap();
        assert_eq!(key.name, "Test");
        assert_eq!(key.usage_count, 0);
        assert_eq!(key.max_usage, 10);
        assert!(key.value.starts_with("key_"));

        // Get
        let fetched = db.get_api_key_sync(USER, &key.id).unwrap();
        assert_eq!(fetched, key);

        // Rename
        db.update_api_key_sync(USER, &key.id, &UpdateApiKey::rename("Renamed"))
            .unwrap();
        let renamed = db.get_api_key_sync(USER, &key.id).unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.value, key.value);

        // List
        let keys = db.list_api_keys_sync(USER, SortOrder::Asc).unwrap();
        assert_eq!(keys.len(), 1);

        // Delete
        db.delete_api_key_sync(USER, &key.id).unwrap();
        assert!(db.list_api_keys_sync(USER, SortOrder::Asc).unwrap().is_empty());
        assert!(matches!(
            db.delete_api_key_sync(USER, &key.id),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn empty_update_on_missing_row_is_not_found() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let result = db.update_api_key_sync(USER, "missing", &UpdateApiKey::default());
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }
}
