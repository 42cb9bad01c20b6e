//! Use-case services sitting between callers (HTTP routes, CLI) and the
//! repositories.
//!
//! # Responsibility
//! - Apply paging and state filters to already fetched sequences.
//! - Enforce list scoping of item lookups.
//! - Orchestrate cascade deletion and bulk state transitions.

pub mod item_service;
pub mod list_service;

use crate::repo::RepoError;

pub use item_service::TodoItemService;
pub use list_service::{ListDeletion, TodoListService};

/// Number of records returned when the caller gives no `top`.
pub const DEFAULT_PAGE_SIZE: usize = 20;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("item {item_id} not found or doesn't belong to list {list_id}")]
    ItemNotInList { item_id: String, list_id: String },
    #[error("item {0} disappeared before its update was applied")]
    ItemNotFound(String),
    #[error("invalid paging parameter `{name}`: `{value}`")]
    InvalidPaging { name: &'static str, value: String },
}

impl From<crate::store::StoreError> for ServiceError {
    fn from(value: crate::store::StoreError) -> Self {
        Self::Repo(value.into())
    }
}

/// Offset window applied to an in-memory result sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub top: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            top: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn new(skip: usize, top: usize) -> Self {
        Self { skip, top }
    }

    /// Parses optional `skip`/`top` query values; absent values fall back to
    /// `0` and `DEFAULT_PAGE_SIZE`.
    pub fn parse(skip: Option<&str>, top: Option<&str>) -> ServiceResult<Self> {
        Ok(Self {
            skip: parse_param("skip", skip, 0)?,
            top: parse_param("top", top, DEFAULT_PAGE_SIZE)?,
        })
    }

    pub fn apply<T>(&self, records: Vec<T>) -> Vec<T> {
        records.into_iter().skip(self.skip).take(self.top).collect()
    }
}

fn parse_param(name: &'static str, value: Option<&str>, default: usize) -> ServiceResult<usize> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ServiceError::InvalidPaging {
            name,
            value: raw.to_string(),
        }),
    }
}
