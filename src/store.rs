use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type Record = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// A single field write inside an `update` patch. `ArrayUnion` appends to the
/// existing array field (creating it if absent) and never deduplicates.
#[derive(Debug, Clone)]
pub enum FieldWrite {
    Set(Value),
    ArrayUnion(Vec<Value>),
}

pub type Patch = Vec<(String, FieldWrite)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    ArrayContains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Composable query over one collection. Filters AND together; ordering is by
/// a single field with missing values treated as the empty string.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<(String, FilterOp, Value)>,
    order_by: Option<(String, Direction)>,
    limit: Option<usize>,
    start_after: Option<Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), op, value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn start_after(mut self, cursor: impl Into<Value>) -> Self {
        self.start_after = Some(cursor.into());
        self
    }
}

#[async_trait]
pub trait Datastore: Send + Sync + 'static {
    /// Write a record under a caller-chosen id. With `merge`, fields are
    /// shallow-merged into any existing record; otherwise the record is
    /// replaced. The id is stamped onto the stored record either way.
    async fn set(&self, collection: &str, id: &str, record: Record, merge: bool) -> StoreResult<()>;

    /// Insert a record under a freshly generated id, stamping `id` and
    /// `created_at`. Returns the id.
    async fn add(&self, collection: &str, record: Record) -> StoreResult<String>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Apply a partial update. Fails with `NotFound` when the id does not
    /// exist. Stamps `updated_at`.
    async fn update(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()>;

    /// Atomic create-if-absent. Returns false (leaving the existing record
    /// untouched) when the id is already present.
    async fn insert_new(&self, collection: &str, id: &str, record: Record) -> StoreResult<bool>;

    /// Atomic query-then-insert: fails with `AlreadyExists` when any record
    /// in the collection already carries `value` in `field`.
    async fn add_unique(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        record: Record,
    ) -> StoreResult<String>;

    /// Materialize all records matching the query. Each call re-evaluates
    /// against current state.
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<Record>>;
}

/// One page of a cursor-paginated query plus the cursor for the next page.
/// `next_cursor` is the ordering-field value of the last returned record and
/// is null when the result set is exhausted.
#[derive(Debug)]
pub struct Page {
    pub records: Vec<Record>,
    pub next_cursor: Option<Value>,
}

/// Fetch `page_size + 1` records, trim to `page_size`, and derive the cursor
/// from the last record kept. Repeating with `start_after(next_cursor)`
/// partitions the ordered result set without omission or duplication.
pub async fn fetch_page(
    store: &dyn Datastore,
    collection: &str,
    query: Query,
    order_field: &str,
    page_size: usize,
) -> StoreResult<Page> {
    let mut records = store
        .query(collection, query.limit(page_size + 1))
        .await?;

    let has_more = records.len() > page_size;
    records.truncate(page_size);

    let next_cursor = if has_more {
        records
            .last()
            .and_then(|record| record.get(order_field).cloned())
    } else {
        None
    };

    Ok(Page {
        records,
        next_cursor,
    })
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// In-memory reference implementation. Collections keep insertion order so
/// unordered queries come back deterministically; every trait operation takes
/// the lock exactly once, which makes `insert_new` and `add_unique` atomic
/// check-then-act.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(String, Record)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn set(&self, collection: &str, id: &str, mut record: Record, merge: bool) -> StoreResult<()> {
        record.insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        match entries.iter_mut().find(|(key, _)| key == id) {
            Some((_, existing)) if merge => {
                for (field, value) in record {
                    existing.insert(field, value);
                }
            }
            Some((_, existing)) => {
                *existing = record;
            }
            None => {
                entries.push((id.to_string(), record));
            }
        }

        Ok(())
    }

    async fn add(&self, collection: &str, mut record: Record) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        record.insert("id".to_string(), Value::String(id.clone()));
        record.insert("created_at".to_string(), Value::String(now_rfc3339()));

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), record));

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|(key, _)| key == id))
            .map(|(_, record)| record.clone()))
    }

    async fn update(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(collection)
            .and_then(|entries| entries.iter_mut().find(|(key, _)| key == id))
            .map(|(_, record)| record)
            .ok_or(StoreError::NotFound)?;

        for (field, write) in patch {
            match write {
                FieldWrite::Set(value) => {
                    record.insert(field, value);
                }
                FieldWrite::ArrayUnion(values) => match record.get_mut(&field) {
                    Some(Value::Array(existing)) => existing.extend(values),
                    _ => {
                        record.insert(field, Value::Array(values));
                    }
                },
            }
        }

        record.insert("updated_at".to_string(), Value::String(now_rfc3339()));
        Ok(())
    }

    async fn insert_new(&self, collection: &str, id: &str, mut record: Record) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        if entries.iter().any(|(key, _)| key == id) {
            return Ok(false);
        }

        record.insert("id".to_string(), Value::String(id.to_string()));
        record.insert("created_at".to_string(), Value::String(now_rfc3339()));
        entries.push((id.to_string(), record));
        Ok(true)
    }

    async fn add_unique(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        mut record: Record,
    ) -> StoreResult<String> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        if entries
            .iter()
            .any(|(_, existing)| existing.get(field) == Some(value))
        {
            return Err(StoreError::AlreadyExists(format!(
                "a record with this {field} already exists"
            )));
        }

        let id = Uuid::new_v4().to_string();
        record.insert("id".to_string(), Value::String(id.clone()));
        record.insert("created_at".to_string(), Value::String(now_rfc3339()));
        entries.push((id.clone(), record));
        Ok(id)
    }

    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<Record>> {
        let collections = self.collections.read().await;
        let entries = match collections.get(collection) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };

        let mut results: Vec<Record> = entries
            .iter()
            .filter(|(_, record)| matches_filters(record, &query.filters))
            .map(|(_, record)| record.clone())
            .collect();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|a, b| {
                let ordering = compare_values(&order_key(a, field), &order_key(b, field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });

            if let Some(cursor) = &query.start_after {
                let position = results
                    .iter()
                    .position(|record| &order_key(record, field) == cursor);
                results = match position {
                    Some(index) => results.split_off(index + 1),
                    None => Vec::new(),
                };
            }
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

fn matches_filters(record: &Record, filters: &[(String, FilterOp, Value)]) -> bool {
    filters.iter().all(|(field, op, value)| match op {
        FilterOp::Equal => record.get(field) == Some(value),
        FilterOp::ArrayContains => match record.get(field) {
            Some(Value::Array(items)) => items.contains(value),
            _ => false,
        },
    })
}

fn order_key(record: &Record, field: &str) -> Value {
    record
        .get(field)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

// Total order over JSON values: by type rank first, then within-type. Order
// fields in this system are RFC 3339 strings or numbers, so lexicographic
// string comparison and f64 number comparison cover the real cases.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Serialize a typed entity into a store record.
pub fn to_record<T: serde::Serialize>(entity: &T) -> StoreResult<Record> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Serialization(serde::ser::Error::custom(
            "entity did not serialize to an object",
        ))),
    }
}

/// Deserialize a store record into a typed entity.
pub fn from_record<T: serde::de::DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
