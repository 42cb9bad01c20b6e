//! Persistence and query layer for todo lists and their items.
//!
//! Callers construct a [`StoreGateway`], configure it once with either the
//! persistent document store or the in-memory substitute, then build
//! repositories or services from it.

pub mod config;
pub mod credential;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig, ObservabilityConfig, StoreBackend};
pub use credential::{
    AccessToken, ChainedCredential, CredentialError, CredentialProvider, DeveloperCliCredential,
    EnvironmentCredential, StaticCredential,
};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::todo_item::{TodoItem, TodoItemPatch, TodoItemState};
pub use model::todo_list::{TodoList, TodoListPatch};
pub use repo::{RepoError, RepoResult, TodoItemRepository, TodoListRepository};
pub use service::{
    ListDeletion, Page, ServiceError, ServiceResult, TodoItemService, TodoListService,
};
pub use store::{
    Document, DocumentCollection, DocumentDatabase, FieldFilter, InMemoryDatabase,
    SqliteDocumentDatabase, StoreError, StoreGateway, StoreResult,
};
