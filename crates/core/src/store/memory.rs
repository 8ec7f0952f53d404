//! In-memory reference implementation of the [`Store`] trait.
//!
//! All collections live behind a single `tokio::sync::RwLock`, so every
//! mutating operation — including the conditional update and the sequence
//! counters — is atomic with respect to concurrent callers. Entries keep
//! insertion order, which gives unordered queries a deterministic base
//! order for the stable sort.
//!
//! `create` stamps `created_at` with a strictly monotonic timestamp: two
//! inserts never share a stamp even when the wall clock does not advance
//! between them.

use super::{Direction, Document, Filter, OrderBy, Store, StoreError, StoreResult, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

struct Entry {
    id: String,
    doc: Document,
}

struct Subscriber {
    collection: String,
    filters: Vec<Filter>,
    order: Vec<OrderBy>,
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Entry>>,
    sequences: HashMap<String, u64>,
    subscribers: Vec<Subscriber>,
    last_stamp: Option<DateTime<Utc>>,
}

/// In-memory document store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Strictly monotonic insert timestamp.
fn stamp(inner: &mut Inner) -> DateTime<Utc> {
    let mut now = Utc::now();
    if let Some(last) = inner.last_stamp {
        if now <= last {
            now = last + Duration::microseconds(1);
        }
    }
    inner.last_stamp = Some(now);
    now
}

fn matches(doc: &Document, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| doc.get(&f.field).unwrap_or(&Value::Null) == &f.value)
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn run_query(entries: &[Entry], filters: &[Filter], order: &[OrderBy]) -> Vec<Document> {
    let mut docs: Vec<Document> = entries
        .iter()
        .filter(|e| matches(&e.doc, filters))
        .map(|e| e.doc.clone())
        .collect();

    if !order.is_empty() {
        docs.sort_by(|a, b| {
            for o in order {
                let av = a.get(&o.field).unwrap_or(&Value::Null);
                let bv = b.get(&o.field).unwrap_or(&Value::Null);
                let ord = match o.direction {
                    Direction::Ascending => cmp_values(av, bv),
                    Direction::Descending => cmp_values(bv, av),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    docs
}

/// Re-runs every live query on `collection` and pushes the fresh result
/// set. Subscribers whose receiving side has been dropped are pruned here.
fn notify(inner: &mut Inner, collection: &str) {
    let Inner {
        collections,
        subscribers,
        ..
    } = inner;
    let empty: Vec<Entry> = Vec::new();
    let entries = collections.get(collection).unwrap_or(&empty);

    subscribers.retain(|sub| {
        if sub.collection != collection {
            return true;
        }
        let snapshot = run_query(entries, &sub.filters, &sub.order);
        sub.tx.send(snapshot).is_ok()
    });
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_owned(),
        id: id.to_owned(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(&self, collection: &str, mut record: Document) -> StoreResult<String> {
        let mut inner = self.inner.write().await;

        let id = Uuid::new_v4().to_string();
        let created_at = stamp(&mut inner);
        record.insert("id".into(), Value::String(id.clone()));
        record.entry("created_at").or_insert_with(|| {
            Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        });

        inner
            .collections
            .entry(collection.to_owned())
            .or_default()
            .push(Entry {
                id: id.clone(),
                doc: record,
            });

        tracing::debug!(collection, id = %id, "created record");
        notify(&mut inner, collection);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let inner = self.inner.read().await;
        let doc = inner
            .collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|e| e.id == id))
            .map(|e| e.doc.clone());
        Ok(doc)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: &[OrderBy],
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read().await;
        let empty: Vec<Entry> = Vec::new();
        let entries = inner.collections.get(collection).unwrap_or(&empty);
        Ok(run_query(entries, filters, order))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .collections
            .get_mut(collection)
            .and_then(|entries| entries.iter_mut().find(|e| e.id == id))
            .ok_or_else(|| not_found(collection, id))?;

        for (field, value) in patch {
            entry.doc.insert(field, value);
        }

        tracing::debug!(collection, id = %id, "updated record");
        notify(&mut inner, collection);
        Ok(())
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        expected: &[Filter],
        patch: Document,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .collections
            .get_mut(collection)
            .and_then(|entries| entries.iter_mut().find(|e| e.id == id))
            .ok_or_else(|| not_found(collection, id))?;

        if !matches(&entry.doc, expected) {
            tracing::debug!(collection, id = %id, "conditional update precondition failed");
            return Ok(false);
        }

        for (field, value) in patch {
            entry.doc.insert(field, value);
        }

        tracing::debug!(collection, id = %id, "conditionally updated record");
        notify(&mut inner, collection);
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let entries = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;
        let index = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(collection, id))?;
        entries.remove(index);

        tracing::debug!(collection, id = %id, "deleted record");
        notify(&mut inner, collection);
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        filters: &[Filter],
        order: &[OrderBy],
    ) -> StoreResult<Subscription> {
        let mut inner = self.inner.write().await;
        let (tx, rx) = mpsc::unbounded_channel();

        let empty: Vec<Entry> = Vec::new();
        let entries = inner.collections.get(collection).unwrap_or(&empty);
        let initial = run_query(entries, filters, order);
        // The receiver is still in scope, so this cannot fail.
        let _ = tx.send(initial);

        inner.subscribers.push(Subscriber {
            collection: collection.to_owned(),
            filters: filters.to_vec(),
            order: order.to_vec(),
            tx,
        });

        Ok(Subscription::new(rx))
    }

    async fn next_sequence(&self, key: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let counter = inner.sequences.entry(key.to_owned()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
