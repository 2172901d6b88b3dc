//! # SQLite Store
//!
//! [`RecordStore`] over a sqlx `SqlitePool`.
//!
//! ## Query Shape
//! ```text
//! find_all_rows  SELECT * FROM "t" ORDER BY id
//! find_row       SELECT * FROM "t" WHERE id = ?
//! insert_row     INSERT INTO "t" ("a", "b") VALUES (?, ?)
//! update_row     UPDATE "t" SET "a" = ?, "b" = ? WHERE id = ?
//! delete_row     DELETE FROM "t" WHERE id = ?
//! ```
//!
//! Statements are built at runtime because the column set comes from the
//! row. Table names come from [`Table`]; column names are checked against
//! `[A-Za-z_][A-Za-z0-9_]*` and quoted, and every value is a bound parameter.

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

use super::{validate_columns, RecordStore, Row};
use crate::error::DbResult;
use stockwise_core::Table;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Record store backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>> {
        let sql = format!("SELECT * FROM \"{}\" ORDER BY id", table.name());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>> {
        let sql = format!("SELECT * FROM \"{}\" WHERE id = ?", table.name());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_json).transpose()
    }

    async fn insert_row(&self, table: Table, row: Row) -> DbResult<i64> {
        validate_columns(&row)?;

        let sql = if row.is_empty() {
            format!("INSERT INTO \"{}\" DEFAULT VALUES", table.name())
        } else {
            let columns: Vec<String> = row.keys().map(|c| format!("\"{}\"", c)).collect();
            let placeholders = vec!["?"; row.len()].join(", ");
            format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                table.name(),
                columns.join(", "),
                placeholders
            )
        };

        let query = row
            .values()
            .fold(sqlx::query(&sql), |query, value| bind_value(query, value));
        let result = query.execute(&self.pool).await?;

        let id = result.last_insert_rowid();
        debug!(table = %table, id, "sqlite insert");
        Ok(id)
    }

    async fn update_row(&self, table: Table, id: i64, mut patch: Row) -> DbResult<bool> {
        patch.remove("id");
        validate_columns(&patch)?;

        if patch.is_empty() {
            return Ok(self.find_row(table, id).await?.is_some());
        }

        let assignments: Vec<String> = patch.keys().map(|c| format!("\"{}\" = ?", c)).collect();
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE id = ?",
            table.name(),
            assignments.join(", ")
        );

        let query = patch
            .values()
            .fold(sqlx::query(&sql), |query, value| bind_value(query, value))
            .bind(id);
        let result = query.execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Value Mapping
// =============================================================================

/// Binds one JSON value as the closest SQLite storage class.
///
/// ```text
/// null    → NULL
/// bool    → INTEGER 0/1
/// number  → INTEGER (or REAL when not an i64)
/// string  → TEXT
/// array / object → TEXT (JSON)
/// ```
fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Reads a row back into JSON using each value's storage class.
fn row_to_json(row: &SqliteRow) -> DbResult<Row> {
    let mut out = Row::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => Number::from_f64(row.try_get::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(index)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::String(row.try_get::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }

    Ok(out)
}

// =============================================================================
// Unit Tests
// =============================================================================
