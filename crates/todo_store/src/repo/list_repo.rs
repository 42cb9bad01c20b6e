//! Todo list repository.
//!
//! # Responsibility
//! - CRUD and full scan over the `TodoList` container.
//!
//! # Invariants
//! - `create` always generates the id and both timestamps.
//! - `update` never changes `id` or `created_date` and never creates.
//! - `update` is read-then-replace; concurrent updates resolve last-write-wins.

use super::document::{new_id, next_update_stamp, TypedCollection};
use super::RepoResult;
use crate::model::todo_list::{TodoList, TodoListPatch};
use crate::store::{DocumentCollection, StoreGateway};
use chrono::Utc;
use std::sync::Arc;

/// Repository over the `TodoList` container.
#[derive(Clone)]
pub struct TodoListRepository {
    lists: TypedCollection<TodoList>,
}

impl TodoListRepository {
    /// Builds a repository from a configured gateway.
    ///
    /// Fails with `StoreError::Uninitialized` before `configure` completes.
    pub fn new(gateway: &StoreGateway) -> RepoResult<Self> {
        Ok(Self::with_collection(gateway.list_collection()?))
    }

    pub fn with_collection(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            lists: TypedCollection::new(collection),
        }
    }

    /// Returns every list; paging is left to callers.
    pub async fn find_all(&self) -> RepoResult<Vec<TodoList>> {
        self.lists.all().await
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<TodoList>> {
        self.lists.get(id).await
    }

    /// Persists a new list built from `patch` and returns the stored entity.
    pub async fn create(&self, patch: TodoListPatch) -> RepoResult<TodoList> {
        let list = TodoList::from_patch(new_id(), patch, Utc::now());
        self.lists.insert(&list).await
    }

    /// Merges `patch` over the stored list. Returns `None` when `id` does not
    /// exist.
    pub async fn update(&self, id: &str, patch: TodoListPatch) -> RepoResult<Option<TodoList>> {
        let Some(mut list) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        list.apply(patch);
        list.id = id.to_string();
        list.updated_date = next_update_stamp(list.updated_date);
        self.lists.replace(&list).await
    }

    /// Returns whether a list was actually removed.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        self.lists.remove(id).await
    }
}
