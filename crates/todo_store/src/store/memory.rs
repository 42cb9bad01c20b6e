//! In-memory document store used for tests and ephemeral runs.
//!
//! # Responsibility
//! - Mirror the persistent store's container semantics and result shapes.
//! - Share container state between every handle obtained from one database.
//!
//! # Invariants
//! - Scans return documents in insertion order.
//! - Concurrent writers to distinct ids never corrupt each other; writers to
//!   the same id resolve last-write-wins.

use super::{
    document_id, stamp_metadata, Document, DocumentCollection, DocumentDatabase, FieldFilter,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

#[derive(Default)]
struct ContainerState {
    next_seq: u64,
    documents: HashMap<String, (u64, Document)>,
}

impl ContainerState {
    fn ordered(&self, filter: Option<&FieldFilter>) -> Vec<Document> {
        let mut rows: Vec<_> = self
            .documents
            .values()
            .filter(|(_, document)| filter.map_or(true, |filter| filter.matches(document)))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, document)| document.clone()).collect()
    }
}

/// One in-memory container. Cloned handles share state.
#[derive(Clone)]
pub struct InMemoryCollection {
    name: String,
    state: Arc<RwLock<ContainerState>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(ContainerState::default())),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every document.
    pub async fn clear(&self) {
        self.state.write().await.documents.clear();
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, mut document: Document) -> StoreResult<Option<Document>> {
        let id = document_id(&document)?;
        let mut state = self.state.write().await;
        if state.documents.contains_key(&id) {
            return Err(StoreError::conflict(&self.name, &id));
        }
        stamp_metadata(&mut document);
        state.next_seq += 1;
        let seq = state.next_seq;
        state.documents.insert(id, (seq, document.clone()));
        Ok(Some(document))
    }

    async fn read_all(&self) -> StoreResult<Vec<Document>> {
        Ok(self.state.read().await.ordered(None))
    }

    async fn query(&self, filter: &FieldFilter) -> StoreResult<Vec<Document>> {
        Ok(self.state.read().await.ordered(Some(filter)))
    }

    async fn read(&self, id: &str) -> StoreResult<Document> {
        self.state
            .read()
            .await
            .documents
            .get(id)
            .map(|(_, document)| document.clone())
            .ok_or_else(|| StoreError::not_found(&self.name, id))
    }

    async fn replace(&self, id: &str, mut document: Document) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        let Some((_, stored)) = state.documents.get_mut(id) else {
            return Err(StoreError::not_found(&self.name, id));
        };
        document.insert("id".to_string(), id.into());
        stamp_metadata(&mut document);
        *stored = document.clone();
        Ok(Some(document))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.state
            .write()
            .await
            .documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(&self.name, id))
    }
}

/// In-memory database; containers are created on first access.
#[derive(Clone)]
pub struct InMemoryDatabase {
    name: String,
    containers: Arc<Mutex<HashMap<String, InMemoryCollection>>>,
}

impl InMemoryDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            containers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the concrete container handle, creating it when missing.
    pub fn collection(&self, name: &str) -> InMemoryCollection {
        let mut containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        containers
            .entry(name.to_string())
            .or_insert_with(|| InMemoryCollection::new(name))
            .clone()
    }

    /// Empties every container created so far.
    pub async fn clear(&self) {
        let collections: Vec<_> = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for collection in collections {
            collection.clear().await;
        }
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl DocumentDatabase for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn container(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(self.collection(name))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryDatabase;
    use crate::store::{Document, DocumentCollection, DocumentDatabase, FieldFilter, StoreError};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn containers_with_same_name_share_state() {
        let db = InMemoryDatabase::default();
        db.container("TodoList")
            .create(doc(json!({"id": "a"})))
            .await
            .unwrap();
        assert_eq!(db.container("TodoList").read_all().await.unwrap().len(), 1);
        assert!(db.container("TodoItem").read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let db = InMemoryDatabase::default();
        let items = db.container("TodoItem");
        assert!(items.read("nope").await.unwrap_err().is_not_found());
        assert!(items.delete("nope").await.unwrap_err().is_not_found());
        let err = items
            .replace("nope", doc(json!({"id": "nope"})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_missing_ids() {
        let db = InMemoryDatabase::default();
        let items = db.container("TodoItem");
        items.create(doc(json!({"id": "a"}))).await.unwrap();
        let err = items.create(doc(json!({"id": "a"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let err = items.create(doc(json!({"name": "x"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[tokio::test]
    async fn query_keeps_insertion_order() {
        let db = InMemoryDatabase::default();
        let items = db.container("TodoItem");
        for (id, list) in [("c", "l1"), ("a", "l2"), ("b", "l1")] {
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
            .into_iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["c", "b"]);
    }

    #[tokio::test]
    async fn clear_empties_all_containers() {
        let db = InMemoryDatabase::default();
        db.container("TodoList")
            .create(doc(json!({"id": "a"})))
            .await
            .unwrap();
        db.container("TodoItem")
            .create(doc(json!({"id": "b"})))
            .await
            .unwrap();
        db.clear().await;
        assert!(db.collection("TodoList").is_empty().await);
        assert!(db.collection("TodoItem").is_empty().await);
    }
}
