//! The Store abstraction.
//!
//! The core never owns patient or room state; it talks to a document store
//! through this seam. Records are flat JSON documents, queries are equality
//! filters plus field ordering, and every operation is asynchronous.
//!
//! Two capabilities beyond plain CRUD are required by the engine:
//!
//! - [`Store::update_if`] — a conditional (compare-and-swap) update. The
//!   room matcher occupies a room with "set occupied only if currently
//!   available" as a single store operation, so two clients racing on the
//!   same room cannot both win.
//! - [`Store::next_sequence`] — an atomic per-key counter. Token allocation
//!   increments a server-side sequence instead of counting waiting patients
//!   and adding one, which would hand the same token to two racing
//!   registrations.

pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// A flat JSON document as stored in a collection.
pub type Document = Map<String, Value>;

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Equality predicate on a single document field.
///
/// A missing field matches only a `null` filter value.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A field + direction pair for query ordering.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Owned handle to a live query.
///
/// The store pushes the full current result set on every change to the
/// watched collection (including one initial snapshot at subscribe time).
/// The component that opened the subscription holds the handle; dropping it
/// closes the channel and the store prunes the registration. There is no
/// ambient unsubscribe slot anywhere.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<Document>>) -> Self {
        Self { rx }
    }

    /// Waits for the next pushed result set. Returns `None` once the store
    /// side has gone away.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }
}

/// Minimal capability set the triage core requires from its document store.
///
/// Implementations must stamp a `created_at` timestamp onto every created
/// document, monotonic per insert within the store, and must assign an
/// opaque `id` field returned from [`Store::create`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a record and returns its store-assigned id.
    async fn create(&self, collection: &str, record: Document) -> StoreResult<String>;

    /// Fetches a record by id, `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Returns all records matching every filter, sorted by `order`.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: &[OrderBy],
    ) -> StoreResult<Vec<Document>>;

    /// Merges `patch` into an existing record. A `null` patch value clears
    /// the field.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<()>;

    /// Conditional update: merges `patch` only if every `expected` predicate
    /// still holds on the current record. Returns `Ok(false)` when the
    /// precondition failed and nothing was written.
    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &[Filter],
        patch: Document,
    ) -> StoreResult<bool>;

    /// Removes a record. Deleting a missing id is a `NotFound` error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Opens a live query over the collection.
    async fn subscribe(
        &self,
        collection: &str,
        filters: &[Filter],
        order: &[OrderBy],
    ) -> StoreResult<Subscription>;

    /// Atomically increments and returns the counter stored under `key`.
    /// The first call for a key returns 1.
    async fn next_sequence(&self, key: &str) -> StoreResult<u64>;
}

/// Serializes a domain value into a flat store document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value).map_err(StoreError::Serialization)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Deserializes a store document into a domain value.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(StoreError::Deserialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientStatus, Room, RoomStatus};

    #[test]
    fn room_round_trips_through_a_document() {
        let room = Room {
            id: "r-1".into(),
            number: "R1".into(),
            status: RoomStatus::Available,
            assigned_patient: None,
            assigned_patient_name: None,
            assigned_at: None,
            created_at: None,
        };
        let doc = to_document(&room).unwrap();
        assert_eq!(doc.get("number"), Some(&Value::String("R1".into())));
        let back: Room = from_document(doc).unwrap();
        assert_eq!(back.number, "R1");
        assert_eq!(back.status, RoomStatus::Available);
    }

    #[test]
    fn to_document_rejects_non_objects() {
        let err = to_document(&PatientStatus::Waiting).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn filter_eq_builds_from_plain_values() {
        let filter = Filter::eq("status", "waiting");
        assert_eq!(filter.field, "status");
        assert_eq!(filter.value, Value::String("waiting".into()));
    }
}
