use rusqlite::Connection;
use serde_json::json;
use todo_store::store::migrations::latest_version;
use std::sync::Arc;
use todo_store::{
    AccessToken, Document, DocumentDatabase, FieldFilter, InMemoryDatabase,
    SqliteDocumentDatabase, StoreError,
};

fn token() -> AccessToken {
    AccessToken::new("token", chrono::Utc::now() + chrono::Duration::minutes(5))
}

fn doc(value: serde_json::Value) -> Document {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn open_applies_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let db = SqliteDocumentDatabase::open(dir.path(), "Todo", &token())
        .await
        .unwrap();
    db.ping().await.unwrap();
    drop(db);

    let conn = Connection::open(dir.path().join("Todo.sqlite3")).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "documents");
}

#[tokio::test]
async fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let first = SqliteDocumentDatabase::open(dir.path(), "Todo", &token())
        .await
        .unwrap();
    first
        .container("TodoList")
        .create(doc(json!({"id": "l1", "name": "kept"})))
        .await
        .unwrap();
    drop(first);

    let second = SqliteDocumentDatabase::open(dir.path(), "Todo", &token())
        .await
        .unwrap();
    let stored = second.container("TodoList").read("l1").await.unwrap();
    assert_eq!(stored["name"], "kept");
}

#[tokio::test]
async fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::open(dir.path().join("Future.sqlite3")).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = SqliteDocumentDatabase::open(dir.path(), "Future", &token())
        .await
        .err()
        .unwrap();
    match err {
        StoreError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn containers_are_isolated_within_one_file() {
    let db = SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap();
    db.container("TodoList")
        .create(doc(json!({"id": "same"})))
        .await
        .unwrap();
    db.container("TodoItem")
        .create(doc(json!({"id": "same"})))
        .await
        .unwrap();

    let err = db
        .container("TodoItem")
        .create(doc(json!({"id": "same"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    assert_eq!(db.container("TodoList").read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn writes_stamp_store_metadata() {
    let db = SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap();
    let lists = db.container("TodoList");
    let created = lists
        .create(doc(json!({"id": "l1", "name": "a"})))
        .await
        .unwrap()
        .unwrap();
    let replaced = lists
        .replace("l1", doc(json!({"name": "b"})))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(replaced["id"], "l1");
    assert!(created["_ts"].is_i64());
    assert_ne!(created["_etag"], replaced["_etag"]);
    assert_eq!(lists.read("l1").await.unwrap()["name"], "b");
}

#[tokio::test]
async fn query_matches_exact_string_values() {
    let db = SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap();
    let items = db.container("TodoItem");
    for (id, list) in [("a", "l1"), ("b", "l10"), ("c", "l1"), ("d", "L1")] {
        items
            .create(doc(json!({"id": id, "listId": list})))
            .await
            .unwrap();
    }

    let filter = FieldFilter::eq("listId", "l1").unwrap();
    let ids: Vec<_> = items
        .query(&filter)
        .await
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["a", "c"]);
}

#[tokio::test]
async fn query_distinguishes_json_types_on_both_backends() {
    let memory: Arc<dyn DocumentDatabase> = Arc::new(InMemoryDatabase::default());
    let sqlite: Arc<dyn DocumentDatabase> =
        Arc::new(SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap());
    for db in [memory, sqlite] {
        let items = db.container("TodoItem");
        for (id, value) in [
            ("int", json!(1)),
            ("bool", json!(true)),
            ("real", json!(1.0)),
            ("text", json!("1")),
        ] {
            items
                .create(doc(json!({"id": id, "v": value})))
                .await
                .unwrap();
        }

        for (value, expected) in [
            (json!(true), "bool"),
            (json!(1), "int"),
            (json!(1.0), "real"),
            (json!("1"), "text"),
        ] {
            let filter = FieldFilter::eq("v", value.clone()).unwrap();
            let ids: Vec<_> = items
                .query(&filter)
                .await
                .unwrap()
                .iter()
                .map(|d| d["id"].as_str().unwrap().to_string())
                .collect();
            assert_eq!(ids, [expected], "backend={} value={value}", db.name());
        }
    }
}

#[tokio::test]
async fn missing_ids_report_not_found() {
    let db = SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap();
    let lists = db.container("TodoList");
    assert!(lists.read("nope").await.unwrap_err().is_not_found());
    assert!(lists.delete("nope").await.unwrap_err().is_not_found());
    assert!(lists
        .replace("nope", doc(json!({})))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn open_rejects_unusable_token_and_bad_names() {
    let dir = tempfile::tempdir().unwrap();
    let blank = AccessToken::new("", chrono::Utc::now() + chrono::Duration::minutes(5));
    let err = SqliteDocumentDatabase::open(dir.path(), "Todo", &blank)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::Unauthorized(_)));

    let err = SqliteDocumentDatabase::open(dir.path(), "../escape", &token())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::InvalidDatabaseName(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
