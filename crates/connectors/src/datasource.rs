//! The CRUD façade shared by every backend.

use crate::error::DatasourceError;
use async_trait::async_trait;
use model::filters::QueryFilters;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;

/// A raw row as returned by a backend: column name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A persisted entity together with the payloads used to write it.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Payload of a create call.
    type Insert: Serialize + Send + Sync;
    /// Payload of a partial update.
    type Patch: Serialize + Send + Sync;
}

#[async_trait]
pub trait Datasource<E: Entity>: Send + Sync {
    /// Handle of an open transaction on the same backend.
    type Transaction: Send;

    /// Inserts one row and returns it as written.
    async fn store(&self, data: &E::Insert) -> Result<E, DatasourceError>;

    /// The first row matching `filters`.
    async fn lookup(&self, filters: &QueryFilters) -> Result<E, DatasourceError>;

    async fn list(&self, filters: &QueryFilters) -> Result<Vec<E>, DatasourceError>;

    /// Updates every row matching `filters` and returns the first updated row.
    async fn modify(&self, filters: &QueryFilters, patch: &E::Patch) -> Result<E, DatasourceError>;

    async fn destroy(&self, filters: &QueryFilters) -> Result<(), DatasourceError>;

    /// A new datasource over the same table whose calls run inside
    /// `transaction`.
    fn with_transaction(&self, transaction: Self::Transaction) -> Result<Self, DatasourceError>
    where
        Self: Sized;
}

/// Runs a unit of work inside a backend transaction.
#[async_trait]
pub trait Transactor: Send + Sync {
    type Handle: Send;

    /// Opens a transaction, passes its handle to `work` and commits when
    /// `work` succeeds. On error the transaction is rolled back and the
    /// error returned unchanged.
    async fn transact<T, F, Fut>(&self, work: F) -> Result<T, DatasourceError>
    where
        T: Send,
        F: FnOnce(Self::Handle) -> Fut + Send,
        Fut: Future<Output = Result<T, DatasourceError>> + Send;
}

/// Decodes a record into an entity.
pub(crate) fn decode<E: Entity>(record: Record) -> Result<E, DatasourceError> {
    Ok(serde_json::from_value(serde_json::Value::Object(record))?)
}

/// Serializes a payload into column/value pairs. The payload must serialize
/// to a JSON object.
pub(crate) fn encode<T: Serialize>(payload: &T) -> Result<Record, DatasourceError> {
    match serde_json::to_value(payload)? {
        serde_json::Value::Object(record) => Ok(record),
        other => Err(DatasourceError::InvalidPayload(format!(
            "expected an object, got {other}"
        ))),
    }
}
