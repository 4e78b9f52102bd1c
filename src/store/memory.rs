//! In-process backing store
//!
//! Rows are kept as JSON objects per table, in insertion order. Criteria
//! follow struct-condition semantics: every criteria field holding a non-zero
//! value must equal the row's field; zero values (null, "", 0, false, empty
//! collections) are ignored.
//!
//! Every operation is counted and can be made to fail on demand, so the store
//! doubles as the test harness for code sitting above it.

use crate::error::{StoreError, StoreResult};
use crate::store::{NamingStrategy, Record, Store};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// In-memory `Store` implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    naming: NamingStrategy,
    tables: RwLock<HashMap<String, Vec<Row>>>,
    operations: AtomicUsize,
    failures: Mutex<VecDeque<StoreError>>,
}

#[derive(Debug, Clone)]
struct Row {
    primary_key: String,
    data: Value,
}

impl MemoryStore {
    /// Create an empty store with plain table names
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given naming strategy
    pub fn with_naming(naming: NamingStrategy) -> Self {
        Self {
            naming,
            ..Default::default()
        }
    }

    /// Number of store operations executed so far (including failed ones)
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Make the next operation fail with `error`
    ///
    /// Multiple queued failures are consumed in order.
    pub async fn fail_next(&self, error: StoreError) {
        self.failures.lock().await.push_back(error);
    }

    /// Physical table names currently holding rows
    pub async fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Physical column names of `table`, in sorted order
    pub async fn columns(&self, table: &str) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables
            .get(table)
            .and_then(|rows| rows.first())
            .and_then(|row| row.data.as_object())
            .map(|fields| {
                fields
                    .keys()
                    .map(|field| self.naming.column_name(field))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    async fn begin(&self, operation: &str, table: &str) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        debug!("Store {} on table {}", operation, table);

        match self.failures.lock().await.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn table_for<R: Record>(&self, record: &R) -> String {
        self.naming.table_name(&record.cache_bucket())
    }

    async fn matching<R: Record>(&self, table: &str, criteria: &R) -> StoreResult<Vec<R>> {
        let conditions = encode(criteria)?;
        let tables = self.tables.read().await;

        tables
            .get(table)
            .map(|rows| rows.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|row| matches_conditions(&row.data, &conditions))
            .map(|row| decode(&row.data))
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_many<R: Record>(&self, criteria: &R) -> StoreResult<Vec<R>> {
        let table = self.table_for(criteria);
        self.begin("find_many", &table).await?;
        self.matching(&table, criteria).await
    }

    async fn find_first<R: Record>(&self, criteria: &R) -> StoreResult<R> {
        let table = self.table_for(criteria);
        self.begin("find_first", &table).await?;
        self.matching(&table, criteria)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(&table, criteria))
    }

    async fn find_last<R: Record>(&self, criteria: &R) -> StoreResult<R> {
        let table = self.table_for(criteria);
        self.begin("find_last", &table).await?;
        self.matching(&table, criteria)
            .await?
            .pop()
            .ok_or_else(|| not_found(&table, criteria))
    }

    async fn count<R: Record>(&self, criteria: &R) -> StoreResult<i64> {
        let table = self.table_for(criteria);
        self.begin("count", &table).await?;
        let rows = self.matching(&table, criteria).await?;
        Ok(rows.len() as i64)
    }

    async fn save<R: Record>(&self, record: &R) -> StoreResult<()> {
        let table = self.table_for(record);
        self.begin("save", &table).await?;

        let primary_key = record.primary_key();
        if primary_key.is_empty() {
            return Err(StoreError::WriteError(format!(
                "record for {} has an empty primary key",
                table
            )));
        }

        let data = encode(record)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        match rows.iter().position(|row| row.primary_key == primary_key) {
            Some(index) => rows[index].data = data,
            None => rows.push(Row { primary_key, data }),
        }

        Ok(())
    }
}

fn not_found<R: Record>(table: &str, criteria: &R) -> StoreError {
    StoreError::NotFound(format!("no row in {} matches {}", table, criteria.cache_key()))
}

fn encode<R: Record>(record: &R) -> StoreResult<Value> {
    serde_json::to_value(record).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn decode<R: Record>(data: &Value) -> StoreResult<R> {
    R::deserialize(data).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn matches_conditions(row: &Value, conditions: &Value) -> bool {
    let Value::Object(conditions) = conditions else {
        return true;
    };

    conditions
        .iter()
        .filter(|(_, expected)| !is_zero(expected))
        .all(|(field, expected)| row.get(field) == Some(expected))
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
