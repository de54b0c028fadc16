//! Persistence handle.
//!
//! Handlers reach records through [`Persistence::model`]; the request
//! pipeline itself never touches the store. [`MemoryStore`] keeps everything
//! in process and is what the binary runs with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::middleware::pagination::ID_FIELD;

/// A stored document.
pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No record found for id '{0}'")]
    NotFound(String),
    #[error("Cast to ObjectId failed for value \"{0}\" at path \"_id\"")]
    InvalidId(String),
    #[error("{0} validation failed: document must be a JSON object")]
    NotAnObject(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One page of a model's records.
#[derive(Debug, Clone, PartialEq)]
pub struct FindResult {
    pub total: usize,
    pub data: Vec<Value>,
}

/// Access to the records of one model.
pub trait ModelHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Records in insertion order, `skip` then at most `limit`.
    fn find(&self, skip: usize, limit: usize) -> BoxFuture<'_, Result<FindResult, StoreError>>;

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Value, StoreError>>;

    /// Store a new record; the store assigns its `_id`.
    fn create(&self, record: Record) -> BoxFuture<'_, Result<Value, StoreError>>;

    /// Merge `changes` into an existing record. `_id` cannot change.
    fn patch<'a>(&'a self, id: &'a str, changes: Record)
        -> BoxFuture<'a, Result<Value, StoreError>>;

    fn remove<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Value, StoreError>>;

    fn count(&self) -> BoxFuture<'_, Result<usize, StoreError>>;
}

/// The database connection shared by every request.
pub trait Persistence: Send + Sync {
    fn model(&self, name: &str) -> Arc<dyn ModelHandle>;

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    models: DashMap<String, Arc<MemoryModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn model(&self, name: &str) -> Arc<dyn ModelHandle> {
        let model = self
            .models
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryModel::new(name)))
            .clone();
        model
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        future::ready(Ok(())).boxed()
    }
}

/// Records of one model, kept with their insertion sequence.
pub struct MemoryModel {
    name: String,
    sequence: AtomicU64,
    records: DashMap<Uuid, (u64, Record)>,
}

impl MemoryModel {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sequence: AtomicU64::new(0),
            records: DashMap::new(),
        }
    }

    fn find_now(&self, skip: usize, limit: usize) -> FindResult {
        let mut rows: Vec<(u64, Record)> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        FindResult {
            total: rows.len(),
            data: rows
                .into_iter()
                .skip(skip)
                .take(limit)
                .map(|(_, record)| Value::Object(record))
                .collect(),
        }
    }

    fn get_now(&self, id: &str) -> Result<Value, StoreError> {
        let key = parse_id(id)?;
        self.records
            .get(&key)
            .map(|entry| Value::Object(entry.value().1.clone()))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn create_now(&self, mut record: Record) -> Value {
        let id = Uuid::new_v4();
        record.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.records.insert(id, (seq, record.clone()));
        Value::Object(record)
    }

    fn patch_now(&self, id: &str, changes: Record) -> Result<Value, StoreError> {
        let key = parse_id(id)?;
        let mut entry = self
            .records
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let record = &mut entry.value_mut().1;
        for (field, value) in changes {
            if field != ID_FIELD {
                record.insert(field, value);
            }
        }
        Ok(Value::Object(record.clone()))
    }

    fn remove_now(&self, id: &str) -> Result<Value, StoreError> {
        let key = parse_id(id)?;
        self.records
            .remove(&key)
            .map(|(_, (_, record))| Value::Object(record))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

impl ModelHandle for MemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, skip: usize, limit: usize) -> BoxFuture<'_, Result<FindResult, StoreError>> {
        future::ready(Ok(self.find_now(skip, limit))).boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Value, StoreError>> {
        future::ready(self.get_now(id)).boxed()
    }

    fn create(&self, record: Record) -> BoxFuture<'_, Result<Value, StoreError>> {
        future::ready(Ok(self.create_now(record))).boxed()
    }

    fn patch<'a>(
        &'a self,
        id: &'a str,
        changes: Record,
    ) -> BoxFuture<'a, Result<Value, StoreError>> {
        future::ready(self.patch_now(id, changes)).boxed()
    }

    fn remove<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Value, StoreError>> {
        future::ready(self.remove_now(id)).boxed()
    }

    fn count(&self) -> BoxFuture<'_, Result<usize, StoreError>> {
        future::ready(Ok(self.records.len())).boxed()
    }
}
