//! Single-initialization gateway to the two todo containers.
//!
//! # Responsibility
//! - Connect to the configured backend once and run the startup liveness check.
//! - Hand out shared `TodoList` / `TodoItem` container handles.
//!
//! # Invariants
//! - `configure`/`attach` succeed at most once per gateway.
//! - Container accessors fail with `StoreError::Uninitialized` until then.
//! - Startup failures are logged and returned, never retried.

use super::memory::InMemoryDatabase;
use super::sqlite::SqliteDocumentDatabase;
use super::{
    DocumentCollection, DocumentDatabase, StoreError, StoreResult, TODO_ITEM_CONTAINER,
    TODO_LIST_CONTAINER,
};
use crate::config::{DatabaseConfig, StoreBackend};
use crate::credential::{CredentialProvider, STORE_SCOPE};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

struct Containers {
    database: Arc<dyn DocumentDatabase>,
    lists: Arc<dyn DocumentCollection>,
    items: Arc<dyn DocumentCollection>,
}

/// Explicitly constructed owner of the store connection.
///
/// Share it behind an `Arc` and build repositories from it after
/// configuration completes.
#[derive(Default)]
pub struct StoreGateway {
    containers: OnceCell<Containers>,
}

impl StoreGateway {
    /// Creates an unconfigured gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway already attached to a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::with_database(Arc::new(InMemoryDatabase::default()))
    }

    /// Creates a gateway attached to `database` without a liveness check.
    pub fn with_database(database: Arc<dyn DocumentDatabase>) -> Self {
        Self {
            containers: OnceCell::new_with(Some(Containers::open(database))),
        }
    }

    /// Connects to the backend named by `config`.
    ///
    /// The `memory` backend ignores `credential` and the endpoint. The
    /// `document` backend acquires a token first, then opens and pings the
    /// database.
    ///
    /// # Errors
    /// - `AlreadyConfigured` on a second call.
    /// - `CredentialUnavailable` when no token can be obtained.
    /// - Any open or liveness failure from the backend.
    pub async fn configure(
        &self,
        config: &DatabaseConfig,
        credential: &dyn CredentialProvider,
    ) -> StoreResult<()> {
        if self.is_configured() {
            return Err(StoreError::AlreadyConfigured);
        }

        let started_at = Instant::now();
        info!(
            "event=store_configure module=store status=start backend={} database={}",
            config.backend, config.database_name
        );

        match self.connect(config, credential).await {
            Ok(()) => {
                info!(
                    "event=store_configure module=store status=ok backend={} duration_ms={}",
                    config.backend,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_configure module=store status=error backend={} duration_ms={} error={}",
                    config.backend,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Attaches an already opened database after a liveness check.
    pub async fn attach(&self, database: Arc<dyn DocumentDatabase>) -> StoreResult<()> {
        database.ping().await?;
        self.containers
            .set(Containers::open(database))
            .map_err(|_| StoreError::AlreadyConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.containers.initialized()
    }

    /// Handle to the `TodoList` container.
    pub fn list_collection(&self) -> StoreResult<Arc<dyn DocumentCollection>> {
        Ok(Arc::clone(&self.containers()?.lists))
    }

    /// Handle to the `TodoItem` container.
    pub fn item_collection(&self) -> StoreResult<Arc<dyn DocumentCollection>> {
        Ok(Arc::clone(&self.containers()?.items))
    }

    /// The underlying database handle.
    pub fn database(&self) -> StoreResult<Arc<dyn DocumentDatabase>> {
        Ok(Arc::clone(&self.containers()?.database))
    }

    fn containers(&self) -> StoreResult<&Containers> {
        self.containers.get().ok_or(StoreError::Uninitialized)
    }

    async fn connect(
        &self,
        config: &DatabaseConfig,
        credential: &dyn CredentialProvider,
    ) -> StoreResult<()> {
        let database: Arc<dyn DocumentDatabase> = match config.backend {
            StoreBackend::Memory => Arc::new(InMemoryDatabase::new(config.database_name.as_str())),
            StoreBackend::Document => {
                let token = credential.get_token(&[STORE_SCOPE]).await?;
                Arc::new(
                    SqliteDocumentDatabase::open(
                        &config.endpoint,
                        &config.database_name,
                        &token,
                    )
                    .await?,
                )
            }
        };
        self.attach(database).await
    }
}

impl Containers {
    fn open(database: Arc<dyn DocumentDatabase>) -> Self {
        Self {
            lists: database.container(TODO_LIST_CONTAINER),
            items: database.container(TODO_ITEM_CONTAINER),
            database,
        }
    }
}
