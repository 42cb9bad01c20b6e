//! Document store abstraction shared by every repository.
//!
//! # Responsibility
//! - Define the container operations repositories depend on.
//! - Provide a persistent SQLite-backed store and an in-memory substitute with
//!   identical result shapes.
//! - Own the single-initialization gateway handing out container handles.
//!
//! # Invariants
//! - Point reads, replaces and deletes of a missing id fail with
//!   `StoreError::NotFound` on every backend.
//! - Documents always carry a caller-supplied string `id`; stores never
//!   generate ids.
//! - Written documents carry store metadata (`_etag`, `_ts`) refreshed on
//!   every write.

use crate::credential::CredentialError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod gateway;
pub mod memory;
pub mod migrations;
mod sqlite;

pub use gateway::StoreGateway;
pub use memory::{InMemoryCollection, InMemoryDatabase};
pub use sqlite::{SqliteCollection, SqliteDocumentDatabase};

/// Container holding `TodoList` documents.
pub const TODO_LIST_CONTAINER: &str = "TodoList";
/// Container holding `TodoItem` documents.
pub const TODO_ITEM_CONTAINER: &str = "TodoItem";

/// JSON object stored as one row of a container.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

static FIELD_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex")
});

/// Errors raised by document store backends and the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store is not initialized; call configure first")]
    Uninitialized,
    #[error("document store is already configured")]
    AlreadyConfigured,
    #[error("store credential unavailable: {0}")]
    CredentialUnavailable(#[from] CredentialError),
    #[error("store rejected credentials: {0}")]
    Unauthorized(String),
    #[error("document `{id}` not found in container `{container}`")]
    NotFound { container: String, id: String },
    #[error("document `{id}` already exists in container `{container}`")]
    Conflict { container: String, id: String },
    #[error("document has no string `id` field")]
    MissingId,
    #[error("invalid filter field name `{0}`")]
    InvalidField(String),
    #[error("invalid database name `{0}`")]
    InvalidDatabaseName(String),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn not_found(container: &str, id: &str) -> Self {
        Self::NotFound {
            container: container.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(container: &str, id: &str) -> Self {
        Self::Conflict {
            container: container.to_string(),
            id: id.to_string(),
        }
    }

    /// Returns whether this is the well-known "document does not exist" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Equality filter on one top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    value: Value,
}

impl FieldFilter {
    /// Builds `field == value`, rejecting field names that are not plain
    /// identifiers.
    pub fn eq(field: &str, value: impl Into<Value>) -> StoreResult<Self> {
        if !FIELD_NAME_PATTERN.is_match(field) {
            return Err(StoreError::InvalidField(field.to_string()));
        }
        Ok(Self {
            field: field.to_string(),
            value: value.into(),
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluates the filter against an in-process document.
    ///
    /// A `null` filter value never matches, mirroring SQL comparison rules.
    pub fn matches(&self, document: &Document) -> bool {
        !self.value.is_null() && document.get(&self.field) == Some(&self.value)
    }
}

/// One logical container of JSON documents keyed by `id`.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Container name.
    fn name(&self) -> &str;

    /// Inserts a new document. Returns the stored resource when the backend
    /// echoes it back.
    async fn create(&self, document: Document) -> StoreResult<Option<Document>>;

    /// Returns every document in insertion order.
    async fn read_all(&self) -> StoreResult<Vec<Document>>;

    /// Returns documents matching `filter` in insertion order.
    async fn query(&self, filter: &FieldFilter) -> StoreResult<Vec<Document>>;

    /// Point read by id.
    async fn read(&self, id: &str) -> StoreResult<Document>;

    /// Replaces the document stored under `id`.
    async fn replace(&self, id: &str, document: Document) -> StoreResult<Option<Document>>;

    /// Removes the document stored under `id`.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// A database exposing named containers.
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    fn name(&self) -> &str;

    /// Liveness check used during startup.
    async fn ping(&self) -> StoreResult<()>;

    /// Returns a handle to the named container.
    fn container(&self, name: &str) -> Arc<dyn DocumentCollection>;
}

pub(crate) fn document_id(document: &Document) -> StoreResult<String> {
    document
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId)
}

/// Stamps store metadata on a document about to be written.
pub(crate) fn stamp_metadata(document: &mut Document) {
    document.insert(
        "_etag".to_string(),
        Value::String(uuid::Uuid::new_v4().to_string()),
    );
    document.insert(
        "_ts".to_string(),
        Value::from(chrono::Utc::now().timestamp()),
    );
}

#[cfg(test)]
mod tests {
    use super::{stamp_metadata, Document, FieldFilter, StoreError};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn field_filter_rejects_paths_and_quotes() {
        assert!(FieldFilter::eq("listId", "l1").is_ok());
        for field in ["", "a.b", "x'--", "1abc", "$.listId"] {
            let err = FieldFilter::eq(field, "l1").unwrap_err();
            assert!(matches!(err, StoreError::InvalidField(_)));
        }
    }

    #[test]
    fn field_filter_matches_exact_values_only() {
        let filter = FieldFilter::eq("listId", "l1").unwrap();
        assert!(filter.matches(&doc(json!({"id": "a", "listId": "l1"}))));
        assert!(!filter.matches(&doc(json!({"id": "b", "listId": "l10"}))));
        assert!(!filter.matches(&doc(json!({"id": "c"}))));
    }

    #[test]
    fn stamp_metadata_refreshes_etag() {
        let mut document = doc(json!({"id": "a"}));
        stamp_metadata(&mut document);
        let first = document["_etag"].clone();
        stamp_metadata(&mut document);
        assert_ne!(first, document["_etag"]);
        assert!(document["_ts"].is_i64());
    }
}
