//! Typed view over an untyped document container.

use super::{RepoError, RepoResult};
use crate::model::Entity;
use crate::store::{Document, DocumentCollection, FieldFilter, StoreError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) struct TypedCollection<T> {
    inner: Arc<dyn DocumentCollection>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

impl<T> TypedCollection<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    pub(crate) fn new(inner: Arc<dyn DocumentCollection>) -> Self {
        Self {
            inner,
            _entity: PhantomData,
        }
    }

    pub(crate) async fn all(&self) -> RepoResult<Vec<T>> {
        self.inner.read_all().await?.into_iter().map(decode::<T>).collect()
    }

    pub(crate) async fn matching(&self, filter: &FieldFilter) -> RepoResult<Vec<T>> {
        self.inner.query(filter).await?.into_iter().map(decode::<T>).collect()
    }

    pub(crate) async fn get(&self, id: &str) -> RepoResult<Option<T>> {
        match self.inner.read(id).await {
            Ok(document) => decode(document).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn insert(&self, entity: &T) -> RepoResult<T> {
        match self.inner.create(encode(entity)?).await? {
            Some(document) => decode(document),
            None => Err(RepoError::MissingResource {
                container: T::CONTAINER,
            }),
        }
    }

    /// Returns `None` when the document disappeared before the write landed.
    pub(crate) async fn replace(&self, entity: &T) -> RepoResult<Option<T>> {
        match self.inner.replace(entity.id(), encode(entity)?).await {
            Ok(Some(document)) => decode(document).map(Some),
            Ok(None) => Err(RepoError::MissingResource {
                container: T::CONTAINER,
            }),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn remove(&self, id: &str) -> RepoResult<bool> {
        match self.inner.delete(id).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// `updated_date` never moves backwards, even if the wall clock does.
pub(crate) fn next_update_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn encode<T: Entity + Serialize>(entity: &T) -> RepoResult<Document> {
    match serde_json::to_value(entity).map_err(StoreError::from)? {
        serde_json::Value::Object(document) => Ok(document),
        other => Err(RepoError::InvalidData {
            container: T::CONTAINER,
            message: format!("entity serialized to non-object JSON `{other}`"),
        }),
    }
}

fn decode<T: Entity + DeserializeOwned>(document: Document) -> RepoResult<T> {
    serde_json::from_value(serde_json::Value::Object(document)).map_err(|err| {
        RepoError::InvalidData {
            container: T::CONTAINER,
            message: err.to_string(),
        }
    })
}
