//! Repositories translating entity operations into container calls.
//!
//! # Responsibility
//! - Generate ids and timestamps; merge partial updates.
//! - Absorb the store's "not found" signal into `None` / `false`.
//!
//! # Invariants
//! - Only `StoreError::NotFound` is absorbed; every other store failure
//!   propagates unchanged.
//! - Repositories hold nothing but a shared container handle.

mod document;
pub mod item_repo;
pub mod list_repo;

use crate::store::StoreError;

pub use item_repo::TodoItemRepository;
pub use list_repo::TodoListRepository;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid persisted {container} document: {message}")]
    InvalidData {
        container: &'static str,
        message: String,
    },
    #[error("store acknowledged a write to {container} without returning the resource")]
    MissingResource { container: &'static str },
}
