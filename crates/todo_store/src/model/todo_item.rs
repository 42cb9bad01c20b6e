//! Todo item domain model.
//!
//! # Invariants
//! - Every item belongs to exactly one list, named by `list_id`.
//! - `state` defaults to `todo` on creation.
//! - `completed_date` is only ever stamped, never cleared, by state transitions.

use super::Entity;
use crate::store::TODO_ITEM_CONTAINER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Workflow state of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoItemState {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TodoItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Done => "done",
        }
    }
}

impl Display for TodoItemState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item state `{0}`; expected todo|inprogress|done")]
pub struct ParseStateError(pub String);

impl FromStr for TodoItemState {
    type Err = ParseStateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}

/// A single task inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub list_id: String,
    pub name: String,
    #[serde(default)]
    pub state: TodoItemState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Entity for TodoItem {
    const CONTAINER: &'static str = TODO_ITEM_CONTAINER;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields for creating or updating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemPatch {
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<TodoItemState>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
}

impl TodoItemPatch {
    /// Patch for a new item named `name` inside `list_id`.
    pub fn new(list_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            list_id: Some(list_id.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: TodoItemState) -> Self {
        self.state = Some(state);
        self
    }
}

impl TodoItem {
    /// Builds a fresh item; missing `list_id`/`name` become empty strings and
    /// a missing state becomes `todo`.
    pub fn from_patch(id: String, patch: TodoItemPatch, now: DateTime<Utc>) -> Self {
        Self {
            id,
            list_id: patch.list_id.unwrap_or_default(),
            name: patch.name.unwrap_or_default(),
            state: patch.state.unwrap_or_default(),
            description: patch.description,
            due_date: patch.due_date,
            completed_date: patch.completed_date,
            created_date: now,
            updated_date: now,
        }
    }

    /// Merges supplied fields over this item. Identity and timestamps are
    /// left to the caller.
    pub fn apply(&mut self, patch: TodoItemPatch) {
        if let Some(list_id) = patch.list_id {
            self.list_id = list_id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(completed_date) = patch.completed_date {
            self.completed_date = Some(completed_date);
        }
    }

    /// Returns whether this item belongs to `list_id`.
    pub fn belongs_to(&self, list_id: &str) -> bool {
        self.list_id == list_id
    }
}
