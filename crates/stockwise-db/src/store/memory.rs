//! # In-Memory Store
//!
//! A [`RecordStore`] kept entirely in process memory.
//!
//! Used as the browser-side backend and as a test fixture. Ids are assigned
//! monotonically per table and never reused, like SQLite's AUTOINCREMENT.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use super::{validate_columns, RecordStore, Row};
use crate::error::{DbError, DbResult};
use stockwise_core::Table;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<i64, Row>>,
    next_ids: HashMap<Table, i64>,
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: Table) -> usize {
        self.tables
            .read()
            .await
            .rows
            .get(&table)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>> {
        let tables = self.tables.read().await;
        Ok(tables.rows.get(&table).and_then(|rows| rows.get(&id)).cloned())
    }

    async fn insert_row(&self, table: Table, mut row: Row) -> DbResult<i64> {
        validate_columns(&row)?;

        let mut tables = self.tables.write().await;
        let next = tables.next_ids.get(&table).copied().unwrap_or(1);

        let id = match row.get("id").and_then(Value::as_i64) {
            Some(explicit) => explicit,
            None => next,
        };

        let rows = tables.rows.entry(table).or_default();
        if rows.contains_key(&id) {
            return Err(DbError::duplicate(format!("{}.id", table), id.to_string()));
        }

        row.insert("id".to_string(), Value::from(id));
        rows.insert(id, row);
        tables.next_ids.insert(table, next.max(id + 1));

        debug!(table = %table, id, "memory insert");
        Ok(id)
    }

    async fn update_row(&self, table: Table, id: i64, patch: Row) -> DbResult<bool> {
        validate_columns(&patch)?;

        let mut tables = self.tables.write().await;
        let Some(row) = tables.rows.get_mut(&table).and_then(|rows| rows.get_mut(&id)) else {
            return Ok(false);
        };

        for (column, value) in patch {
            if column != "id" {
                row.insert(column, value);
            }
        }
        Ok(true)
    }

    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.remove(&id))
            .is_some())
    }
}
