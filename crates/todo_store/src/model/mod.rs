//! Domain model for todo lists and the items they own.
//!
//! # Responsibility
//! - Define the canonical records persisted in the `TodoList` and `TodoItem`
//!   containers.
//! - Define the partial shapes callers use for create/update.
//!
//! # Invariants
//! - `id`, `created_date` and `updated_date` are assigned by repositories and
//!   never taken from caller input.
//! - Items reference their list through `list_id` only; there is no owning
//!   pointer between entities.

pub mod todo_item;
pub mod todo_list;

/// Record persisted as one document in a store container.
pub trait Entity {
    /// Container the entity lives in.
    const CONTAINER: &'static str;

    /// Store-level document id.
    fn id(&self) -> &str;
}
