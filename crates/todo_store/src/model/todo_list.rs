//! Todo list domain model.
//!
//! # Invariants
//! - `id` is generated once on create and never changes afterwards.
//! - `updated_date >= created_date` for every persisted list.

use super::Entity;
use crate::store::TODO_LIST_CONTAINER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named collection of todo items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Entity for TodoList {
    const CONTAINER: &'static str = TODO_LIST_CONTAINER;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields for creating or updating a list.
///
/// `None` means "not supplied": create falls back to defaults, update keeps
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TodoListPatch {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl TodoList {
    /// Builds a fresh list with a generated id and both timestamps set to `now`.
    pub fn from_patch(id: String, patch: TodoListPatch, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: patch.name.unwrap_or_default(),
            description: patch.description,
            created_date: now,
            updated_date: now,
        }
    }

    /// Merges supplied fields over this list. Identity and timestamps are
    /// left to the caller.
    pub fn apply(&mut self, patch: TodoListPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }
}
