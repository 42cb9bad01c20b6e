//! Todo list use cases.

use super::{Page, ServiceResult};
use crate::model::todo_list::{TodoList, TodoListPatch};
use crate::repo::{TodoItemRepository, TodoListRepository};
use crate::store::StoreGateway;
use log::info;

/// Outcome of deleting a list together with its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDeletion {
    /// Whether the list row itself existed and was removed.
    pub list_deleted: bool,
    /// Items removed by the cascade, even when the list was already gone.
    pub items_deleted: usize,
}

#[derive(Clone)]
pub struct TodoListService {
    lists: TodoListRepository,
    items: TodoItemRepository,
}

impl TodoListService {
    pub fn new(lists: TodoListRepository, items: TodoItemRepository) -> Self {
        Self { lists, items }
    }

    pub fn from_gateway(gateway: &StoreGateway) -> ServiceResult<Self> {
        Ok(Self::new(
            TodoListRepository::new(gateway)?,
            TodoItemRepository::new(gateway)?,
        ))
    }

    pub async fn list_lists(&self, page: Page) -> ServiceResult<Vec<TodoList>> {
        Ok(page.apply(self.lists.find_all().await?))
    }

    pub async fn get_list(&self, list_id: &str) -> ServiceResult<Option<TodoList>> {
        Ok(self.lists.find_by_id(list_id).await?)
    }

    pub async fn create_list(&self, patch: TodoListPatch) -> ServiceResult<TodoList> {
        Ok(self.lists.create(patch).await?)
    }

    pub async fn update_list(
        &self,
        list_id: &str,
        patch: TodoListPatch,
    ) -> ServiceResult<Option<TodoList>> {
        Ok(self.lists.update(list_id, patch).await?)
    }

    /// Deletes the list's items first, then the list.
    ///
    /// An interruption between the two steps leaves the list in place with
    /// some or all of its items gone, never items without a list.
    pub async fn delete_list(&self, list_id: &str) -> ServiceResult<ListDeletion> {
        let items_deleted = self.items.delete_by_list_id(list_id).await?;
        let list_deleted = self.lists.delete(list_id).await?;
        info!(
            "event=list_delete module=service status=ok list_deleted={list_deleted} items_deleted={items_deleted}"
        );
        Ok(ListDeletion {
            list_deleted,
            items_deleted,
        })
    }
}
