//! Todo item repository.
//!
//! # Responsibility
//! - CRUD over the `TodoItem` container plus the `listId` equality query.
//! - Cascade deletion of a list's items.
//!
//! # Invariants
//! - `create` defaults `state` to `todo` and `list_id` to an empty string.
//! - `delete_by_list_id` is not atomic: items removed before a failure stay
//!   removed.

use super::document::{new_id, next_update_stamp, TypedCollection};
use super::RepoResult;
use crate::model::todo_item::{TodoItem, TodoItemPatch};
use crate::store::{DocumentCollection, FieldFilter, StoreGateway};
use chrono::Utc;
use log::info;
use std::sync::Arc;

const LIST_ID_FIELD: &str = "listId";

/// Repository over the `TodoItem` container.
#[derive(Clone)]
pub struct TodoItemRepository {
    items: TypedCollection<TodoItem>,
}

impl TodoItemRepository {
    /// Builds a repository from a configured gateway.
    pub fn new(gateway: &StoreGateway) -> RepoResult<Self> {
        Ok(Self::with_collection(gateway.item_collection()?))
    }

    pub fn with_collection(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            items: TypedCollection::new(collection),
        }
    }

    /// Returns every item whose `listId` equals `list_id`, in store order.
    pub async fn find_by_list_id(&self, list_id: &str) -> RepoResult<Vec<TodoItem>> {
        let filter = FieldFilter::eq(LIST_ID_FIELD, list_id)?;
        self.items.matching(&filter).await
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<TodoItem>> {
        self.items.get(id).await
    }

    pub async fn create(&self, patch: TodoItemPatch) -> RepoResult<TodoItem> {
        let item = TodoItem::from_patch(new_id(), patch, Utc::now());
        self.items.insert(&item).await
    }

    /// Merges `patch` over the stored item. Returns `None` when `id` does not
    /// exist.
    pub async fn update(&self, id: &str, patch: TodoItemPatch) -> RepoResult<Option<TodoItem>> {
        let Some(mut item) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        item.apply(patch);
        item.id = id.to_string();
        item.updated_date = next_update_stamp(item.updated_date);
        self.items.replace(&item).await
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        self.items.remove(id).await
    }

    /// Deletes every item of `list_id` one by one and returns how many were
    /// actually removed.
    pub async fn delete_by_list_id(&self, list_id: &str) -> RepoResult<usize> {
        let items = self.find_by_list_id(list_id).await?;
        let found = items.len();
        let mut deleted = 0;
        for item in items {
            if self.delete(&item.id).await? {
                deleted += 1;
            }
        }
        info!(
            "event=items_cascade_delete module=repo status=ok found={found} deleted={deleted}"
        );
        Ok(deleted)
    }
}
