//! Todo item use cases, all scoped to one list.
//!
//! # Invariants
//! - An item whose `list_id` differs from the requested list is treated as
//!   absent.
//! - Bulk transitions validate every id before writing anything.
//! - Moving to `done` stamps `completed_date`; other targets leave it as is.

use super::{Page, ServiceError, ServiceResult};
use crate::model::todo_item::{TodoItem, TodoItemPatch, TodoItemState};
use crate::repo::TodoItemRepository;
use crate::store::StoreGateway;
use chrono::Utc;
use futures::future::try_join_all;
use log::{info, warn};
use std::collections::HashSet;

#[derive(Clone)]
pub struct TodoItemService {
    items: TodoItemRepository,
}

impl TodoItemService {
    pub fn new(items: TodoItemRepository) -> Self {
        Self { items }
    }

    pub fn from_gateway(gateway: &StoreGateway) -> ServiceResult<Self> {
        Ok(Self::new(TodoItemRepository::new(gateway)?))
    }

    pub async fn list_items(&self, list_id: &str, page: Page) -> ServiceResult<Vec<TodoItem>> {
        Ok(page.apply(self.items.find_by_list_id(list_id).await?))
    }

    /// Items of `list_id` in `state`, filtered after the fetch.
    pub async fn list_items_by_state(
        &self,
        list_id: &str,
        state: TodoItemState,
        page: Page,
    ) -> ServiceResult<Vec<TodoItem>> {
        let items = self
            .items
            .find_by_list_id(list_id)
            .await?
            .into_iter()
            .filter(|item| item.state == state)
            .collect();
        Ok(page.apply(items))
    }

    /// Creates an item inside `list_id`, overriding any `list_id` in `patch`.
    pub async fn create_item(&self, list_id: &str, patch: TodoItemPatch) -> ServiceResult<TodoItem> {
        let patch = TodoItemPatch {
            list_id: Some(list_id.to_string()),
            ..patch
        };
        Ok(self.items.create(patch).await?)
    }

    pub async fn get_item(&self, list_id: &str, item_id: &str) -> ServiceResult<Option<TodoItem>> {
        Ok(self
            .items
            .find_by_id(item_id)
            .await?
            .filter(|item| item.belongs_to(list_id)))
    }

    /// Updates an item of `list_id`; the item cannot be moved to another list.
    pub async fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        patch: TodoItemPatch,
    ) -> ServiceResult<Option<TodoItem>> {
        if self.get_item(list_id, item_id).await?.is_none() {
            return Ok(None);
        }
        let patch = TodoItemPatch {
            list_id: Some(list_id.to_string()),
            ..patch
        };
        Ok(self.items.update(item_id, patch).await?)
    }

    /// Returns whether an item of `list_id` was removed.
    pub async fn delete_item(&self, list_id: &str, item_id: &str) -> ServiceResult<bool> {
        if self.get_item(list_id, item_id).await?.is_none() {
            return Ok(false);
        }
        Ok(self.items.delete(item_id).await?)
    }

    /// Moves every item in `item_ids` to `state`.
    ///
    /// All ids are validated first; one missing or foreign id rejects the
    /// whole batch with `ItemNotInList` and nothing is written. The updates
    /// then run concurrently. A failure at that point is returned, but
    /// updates that already landed stay applied.
    ///
    /// Returns the number of distinct items updated.
    pub async fn transition_state(
        &self,
        list_id: &str,
        state: TodoItemState,
        item_ids: &[String],
    ) -> ServiceResult<usize> {
        let mut seen = HashSet::new();
        let ids: Vec<&str> = item_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let found = try_join_all(ids.iter().map(|id| self.items.find_by_id(id))).await?;
        for (id, item) in ids.iter().zip(&found) {
            if !item.as_ref().is_some_and(|item| item.belongs_to(list_id)) {
                warn!(
                    "event=items_state_transition module=service status=rejected state={state} batch_size={}",
                    ids.len()
                );
                return Err(ServiceError::ItemNotInList {
                    item_id: (*id).to_string(),
                    list_id: list_id.to_string(),
                });
            }
        }

        let completed_date = (state == TodoItemState::Done).then(Utc::now);
        let patch = TodoItemPatch {
            state: Some(state),
            completed_date,
            ..TodoItemPatch::default()
        };
        let updates = ids.iter().map(|id| self.apply_patch(id, patch.clone()));
        try_join_all(updates).await?;

        info!(
            "event=items_state_transition module=service status=ok state={state} batch_size={}",
            ids.len()
        );
        Ok(ids.len())
    }

    async fn apply_patch(&self, item_id: &str, patch: TodoItemPatch) -> ServiceResult<()> {
        match self.items.update(item_id, patch).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::ItemNotFound(item_id.to_string())),
        }
    }
}
