//! SQLite-backed persistent document store.
//!
//! # Responsibility
//! - Persist container documents as JSON rows in one `documents` table.
//! - Run blocking SQLite calls off the async runtime.
//!
//! # Invariants
//! - Returned databases have migrations fully applied.
//! - `(container, id)` is unique; scans follow insertion order (`seq`).
//! - Opening requires an unexpired access token.
//! - Equality queries compare JSON types as well as values, so `true`, `1`
//!   and `1.0` are distinct, matching the in-memory store.

use super::migrations::apply_migrations;
use super::{
    document_id, stamp_metadata, Document, DocumentCollection, DocumentDatabase, FieldFilter,
    StoreError, StoreResult,
};
use crate::credential::AccessToken;
use async_trait::async_trait;
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DATABASE_FILE_EXTENSION: &str = "sqlite3";

type SharedConnection = Arc<Mutex<Connection>>;

/// Persistent document database stored in `<endpoint>/<name>.sqlite3`.
pub struct SqliteDocumentDatabase {
    name: String,
    conn: SharedConnection,
}

impl SqliteDocumentDatabase {
    /// Opens (creating when needed) the database file under `endpoint`.
    ///
    /// # Errors
    /// - `Unauthorized` when `token` is empty or expired.
    /// - `InvalidDatabaseName` when `database_name` is not a plain file stem.
    /// - `UnsupportedSchemaVersion` when the file was written by a newer build.
    pub async fn open(
        endpoint: impl AsRef<Path>,
        database_name: &str,
        token: &AccessToken,
    ) -> StoreResult<Self> {
        if !token.is_usable() {
            return Err(StoreError::Unauthorized(
                "access token is empty or expired".to_string(),
            ));
        }
        let path = database_path(endpoint.as_ref(), database_name)?;
        let name = database_name.to_string();

        let conn = tokio::task::spawn_blocking(move || open_file(&path)).await??;
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory SQLite database with the same schema.
    pub async fn open_in_memory(database_name: &str) -> StoreResult<Self> {
        let conn = tokio::task::spawn_blocking(|| {
            let started_at = Instant::now();
            let mut conn = Connection::open_in_memory()?;
            bootstrap_connection(&mut conn)?;
            info!(
                "event=store_open module=store status=ok mode=memory duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok::<_, StoreError>(conn)
        })
        .await??;
        Ok(Self {
            name: database_name.to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl DocumentDatabase for SqliteDocumentDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> StoreResult<()> {
        run_blocking(&self.conn, |conn| {
            conn.query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    fn container(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(SqliteCollection {
            name: name.to_string(),
            conn: Arc::clone(&self.conn),
        })
    }
}

/// One container inside a `SqliteDocumentDatabase`.
pub struct SqliteCollection {
    name: String,
    conn: SharedConnection,
}

#[async_trait]
impl DocumentCollection for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, mut document: Document) -> StoreResult<Option<Document>> {
        let id = document_id(&document)?;
        stamp_metadata(&mut document);
        let body = serde_json::to_string(&document)?;
        let container = self.name.clone();

        run_blocking(&self.conn, move |conn| {
            match conn.execute(
                "INSERT INTO documents (container, id, body) VALUES (?1, ?2, ?3);",
                params![container, id, body],
            ) {
                Ok(_) => Ok(Some(document)),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::conflict(&container, &id))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn read_all(&self) -> StoreResult<Vec<Document>> {
        let container = self.name.clone();
        run_blocking(&self.conn, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM documents
                 WHERE container = ?1
                 ORDER BY seq ASC;",
            )?;
            let bodies = stmt
                .query_map([container], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            decode_bodies(bodies)
        })
        .await
    }

    async fn query(&self, filter: &FieldFilter) -> StoreResult<Vec<Document>> {
        if filter.value().is_null() {
            return Ok(Vec::new());
        }
        let container = self.name.clone();
        let path = format!("$.{}", filter.field());
        let value = serde_json::to_string(filter.value())?;

        run_blocking(&self.conn, move |conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM documents
                 WHERE container = ?1
                   AND json_type(body, ?2) = json_type(?3, '$')
                   AND json_extract(body, ?2) = json_extract(?3, '$')
                 ORDER BY seq ASC;",
            )?;
            let bodies = stmt
                .query_map(params![container, path, value], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            decode_bodies(bodies)
        })
        .await
    }

    async fn read(&self, id: &str) -> StoreResult<Document> {
        let container = self.name.clone();
        let id = id.to_string();
        run_blocking(&self.conn, move |conn| {
            let body = conn
                .query_row(
                    "SELECT body FROM documents WHERE container = ?1 AND id = ?2;",
                    params![container, id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            match body {
                Some(body) => Ok(serde_json::from_str(&body)?),
                None => Err(StoreError::not_found(&container, &id)),
            }
        })
        .await
    }

    async fn replace(&self, id: &str, mut document: Document) -> StoreResult<Option<Document>> {
        document.insert("id".to_string(), id.into());
        stamp_metadata(&mut document);
        let body = serde_json::to_string(&document)?;
        let container = self.name.clone();
        let id = id.to_string();

        run_blocking(&self.conn, move |conn| {
            let changed = conn.execute(
                "UPDATE documents SET body = ?3 WHERE container = ?1 AND id = ?2;",
                params![container, id, body],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found(&container, &id));
            }
            Ok(Some(document))
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let container = self.name.clone();
        let id = id.to_string();
        run_blocking(&self.conn, move |conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE container = ?1 AND id = ?2;",
                params![container, id],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found(&container, &id));
            }
            Ok(())
        })
        .await
    }
}

async fn run_blocking<T, F>(conn: &SharedConnection, op: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let conn = conn.blocking_lock();
        op(&conn)
    })
    .await?
}

fn decode_bodies(bodies: Vec<String>) -> StoreResult<Vec<Document>> {
    bodies
        .iter()
        .map(|body| serde_json::from_str::<Document>(body).map_err(StoreError::from))
        .collect()
}

fn database_path(endpoint: &Path, database_name: &str) -> StoreResult<PathBuf> {
    let trimmed = database_name.trim();
    let is_plain_stem = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\']);
    if !is_plain_stem {
        return Err(StoreError::InvalidDatabaseName(database_name.to_string()));
    }
    Ok(endpoint.join(format!("{trimmed}.{DATABASE_FILE_EXTENSION}")))
}

fn open_file(path: &Path) -> StoreResult<Connection> {
    let started_at = Instant::now();
    info!("event=store_open module=store status=start mode=file");

    let result = (|| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path)?;
        bootstrap_connection(&mut conn)?;
        Ok::<_, StoreError>(conn)
    })();

    match result {
        Ok(conn) => {
            info!(
                "event=store_open module=store status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=store_open module=store status=error mode=file duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
