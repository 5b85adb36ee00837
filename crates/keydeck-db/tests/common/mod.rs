// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use keydeck_core::{NewApiKey, SortOrder, UpdateApiKey};
use keydeck_db::{Database, DbError};

pub const USER: &str = "dev-local";
pub const OTHER_USER: &str = "someone-else";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_key(name: &str, max_usage: i64) -> NewApiKey {
    NewApiKey::generate(name, max_usage)
}

async fn names(db: &dyn Database, order: SortOrder) -> Vec<String> {
    db.list_api_keys(USER, order)
        .await
        .unwrap()
        .into_iter()
        .map(|k| k.name)
        .collect()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Insert, get, list, update and delete a single key.
pub async fn test_api_key_crud(db: &dyn Database) {
    let key = db.insert_api_key(USER, &new_key("Test", 10)).await.unwrap();
    assert_eq!(key.name, "Test");
    assert_eq!(key.usage_count, 0);
    assert_eq!(key.max_usage, 10);
    assert!(key.value.starts_with("key_"));
    assert!(!key.id.is_empty());

    let fetched = db.get_api_key(USER, &key.id).await.unwrap();
    assert_eq!(fetched.id, key.id);
    assert_eq!(fetched.value, key.value);

    let all = db.list_api_keys(USER, SortOrder::Asc).await.unwrap();
    assert_eq!(all.len(), 1);

    db.update_api_key(USER, &key.id, &UpdateApiKey::rename("Renamed"))
        .await
        .unwrap();
    let renamed = db.get_api_key(USER, &key.id).await.unwrap();
    assert_eq!(renamed.name, "Renamed");
    // unchanged fields preserved
    assert_eq!(renamed.value, key.value);
    assert_eq!(renamed.max_usage, 10);
    assert_eq!(renamed.usage_count, 0);

    db.delete_api_key(USER, &key.id).await.unwrap();
    assert!(db.list_api_keys(USER, SortOrder::Asc).await.unwrap().is_empty());

    assert!(matches!(
        db.get_api_key(USER, &key.id).await,
        Err(DbError::NotFound(_))
    ));
}

/// Replacing the value keeps every other column.
pub async fn test_replace_value(db: &dyn Database) {
    let key = db.insert_api_key(USER, &new_key("Rotate", 5)).await.unwrap();

    db.update_api_key(USER, &key.id, &UpdateApiKey::replace_value("key_fresh"))
        .await
        .unwrap();

    let rotated = db.get_api_key(USER, &key.id).await.unwrap();
    assert_eq!(rotated.value, "key_fresh");
    assert_eq!(rotated.id, key.id);
    assert_eq!(rotated.name, key.name);
    assert_eq!(rotated.usage_count, key.usage_count);
    assert_eq!(rotated.max_usage, key.max_usage);
    assert_eq!(rotated.created_at, key.created_at);
}

/// Update with every field set, then with none.
pub async fn test_update_all_fields_and_none(db: &dyn Database) {
    let key = db.insert_api_key(USER, &new_key("All", 5)).await.unwrap();

    db.update_api_key(
        USER,
        &key.id,
        &UpdateApiKey {
            name: Some("Everything".into()),
            value: Some("key_everything".into()),
            max_usage: Some(99),
        },
    )
    .await
    .unwrap();
    let updated = db.get_api_key(USER, &key.id).await.unwrap();
    assert_eq!(updated.name, "Everything");
    assert_eq!(updated.value, "key_everything");
    assert_eq!(updated.max_usage, 99);

    db.update_api_key(USER, &key.id, &UpdateApiKey::default())
        .await
        .unwrap();
    let unchanged = db.get_api_key(USER, &key.id).await.unwrap();
    assert_eq!(unchanged, updated);
}

/// Missing rows surface NotFound for update and delete.
pub async fn test_missing_rows(db: &dyn Database) {
    assert!(matches!(
        db.update_api_key(USER, "no-such-id", &UpdateApiKey::rename("x"))
            .await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_api_key(USER, "no-such-id").await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Name ordering is case-sensitive byte order, reversible.
pub async fn test_name_ordering(db: &dyn Database) {
    for name in ["beta", "Alpha", "alpha", "Zeta", "gamma"] {
        db.insert_api_key(USER, &new_key(name, 1)).await.unwrap();
    }

    let asc = names(db, SortOrder::Asc).await;
    assert_eq!(asc, vec!["Alpha", "Zeta", "alpha", "beta", "gamma"]);

    let mut desc = names(db, SortOrder::Desc).await;
    desc.reverse();
    assert_eq!(desc, asc);
}

/// Duplicate names come back in a stable order.
pub async fn test_duplicate_names_stable(db: &dyn Database) {
    db.insert_api_key(USER, &new_key("same", 1)).await.unwrap();
    db.insert_api_key(USER, &new_key("same", 2)).await.unwrap();

    let first: Vec<String> = db
        .list_api_keys(USER, SortOrder::Asc)
        .await
        .unwrap()
        .into_iter()
        .map(|k| k.id)
        .collect();
    let second: Vec<String> = db
        .list_api_keys(USER, SortOrder::Asc)
        .await
        .unwrap()
        .into_iter()
        .map(|k| k.id)
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

// ---------------------------------------------------------------------------
// User scoping
// ---------------------------------------------------------------------------

/// Rows of another user are invisible and immutable.
pub async fn test_user_scoping(db: &dyn Database) {
    let mine = db.insert_api_key(USER, &new_key("mine", 1)).await.unwrap();
    let theirs = db
        .insert_api_key(OTHER_USER, &new_key("theirs", 1))
        .await
        .unwrap();

    let listed = db.list_api_keys(USER, SortOrder::Asc).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);

    assert!(matches!(
        db.get_api_key(USER, &theirs.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.update_api_key(USER, &theirs.id, &UpdateApiKey::rename("hijack"))
            .await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_api_key(USER, &theirs.id).await,
        Err(DbError::NotFound(_))
    ));

    let still_there = db.get_api_key(OTHER_USER, &theirs.id).await.unwrap();
    assert_eq!(still_there.name, "theirs");
}

/// Values are not checked for uniqueness.
pub async fn test_duplicate_values_allowed(db: &dyn Database) {
    let input = NewApiKey {
        name: "one".into(),
        value: "key_duplicate".into(),
        usage_count: 0,
        max_usage: 1,
    };
    db.insert_api_key(USER, &input).await.unwrap();
    db.insert_api_key(
        USER,
        &NewApiKey {
            name: "two".into(),
            ..input.clone()
        },
    )
    .await
    .unwrap();
    assert_eq!(db.list_api_keys(USER, SortOrder::Asc).await.unwrap().len(), 2);
}
