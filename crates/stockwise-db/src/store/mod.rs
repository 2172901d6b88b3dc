//! # Record Store
//!
//! Table-oriented persistence behind one object-safe trait.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service code                                                           │
//! │       │  store.insert(&vendor) / store.find_all::<Product>()            │
//! │       ▼                                                                 │
//! │  RecordStoreExt (typed, blanket impl)                                   │
//! │       │  validate → serde_json row → raw call → decode                  │
//! │       ▼                                                                 │
//! │  RecordStore (raw rows, object safe)                                    │
//! │       │                                                                 │
//! │       ├──► SqliteStore   (sqlx, file or :memory:)                       │
//! │       ├──► MemoryStore   (BTreeMap per table)                           │
//! │       └──► UnitOfWork    (journals compensations, delegates)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no filtering or joining: callers read whole tables and filter in
//! memory. Rows that do not decode into the requested entity surface as
//! [`DbError::Decode`] instead of reaching service code half-formed.

pub mod memory;
pub mod sqlite;
pub mod unit_of_work;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockwise_core::{Entity, Table};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use unit_of_work::UnitOfWork;

/// A stored record as column → JSON value.
pub type Row = Map<String, Value>;

// =============================================================================
// Raw Trait
// =============================================================================

/// Raw row access to every [`Table`].
///
/// Implementations must:
/// - return `find_all_rows` ordered by id
/// - honour an explicit `"id"` key on insert
/// - report missing rows as `Ok(None)` / `Ok(false)`, not as errors
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>>;

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>>;

    /// Inserts a row and returns its id.
    async fn insert_row(&self, table: Table, row: Row) -> DbResult<i64>;

    /// Overwrites the named columns. Returns false when no row has `id`.
    async fn update_row(&self, table: Table, id: i64, patch: Row) -> DbResult<bool>;

    /// Returns false when no row has `id`.
    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool>;
}

// =============================================================================
// Typed Extension
// =============================================================================

/// Typed operations over [`Entity`] types, available on every store.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    async fn find_all<T: Entity>(&self) -> DbResult<Vec<T>> {
        debug!(table = %T::TABLE, "find_all");
        self.find_all_rows(T::TABLE)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    async fn find_by_id<T: Entity>(&self, id: i64) -> DbResult<Option<T>> {
        debug!(table = %T::TABLE, id, "find_by_id");
        self.find_row(T::TABLE, id).await?.map(decode::<T>).transpose()
    }

    /// Validates, then inserts. Returns the new id.
    async fn insert<T: Entity>(&self, entity: &T) -> DbResult<i64> {
        entity.validate()?;
        let row = encode(entity)?;
        let id = self.insert_row(T::TABLE, row).await?;
        debug!(table = %T::TABLE, id, "inserted");
        Ok(id)
    }

    /// Validates, then replaces every column except `id`.
    async fn update<T: Entity>(&self, id: i64, entity: &T) -> DbResult<bool> {
        entity.validate()?;
        let mut row = encode(entity)?;
        row.remove("id");
        debug!(table = %T::TABLE, id, "update");
        self.update_row(T::TABLE, id, row).await
    }

    /// Overwrites only the columns present in `patch`.
    async fn patch<T: Entity>(&self, id: i64, patch: Row) -> DbResult<bool> {
        debug!(table = %T::TABLE, id, columns = patch.len(), "patch");
        self.update_row(T::TABLE, id, patch).await
    }

    async fn delete<T: Entity>(&self, id: i64) -> DbResult<bool> {
        debug!(table = %T::TABLE, id, "delete");
        self.delete_row(T::TABLE, id).await
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

// =============================================================================
// Row Conversion
// =============================================================================

/// Serializes an entity into a row. A `None` id is left out.
pub fn encode<T: Entity>(entity: &T) -> DbResult<Row> {
    match serde_json::to_value(entity).map_err(|e| DbError::Encode(e.to_string()))? {
        Value::Object(mut row) => {
            if row.get("id").is_some_and(Value::is_null) {
                row.remove("id");
            }
            Ok(row)
        }
        other => Err(DbError::Encode(format!(
            "{} entity serialized to {} instead of an object",
            T::TABLE,
            other
        ))),
    }
}

/// Decodes a row into an entity.
pub fn decode<T: Entity>(row: Row) -> DbResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DbError::decode(T::TABLE, e))
}

/// Builds a patch from `(column, value)` pairs.
///
/// ```rust
/// use stockwise_db::store::patch_of;
///
/// use serde_json::json;
///
/// let patch = patch_of([("status", json!("cancelled")), ("total_cents", json!(0))]);
/// assert_eq!(patch.len(), 2);
/// ```
pub fn patch_of<I>(pairs: I) -> Row
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// Column names must be plain identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_column(name: &str) -> DbResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidColumn(name.to_string()))
    }
}

pub(crate) fn validate_columns(row: &Row) -> DbResult<()> {
    row.keys().try_for_each(|k| validate_column(k))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use stockwise_core::Vendor;

    fn vendor(name: &str) -> Vendor {
        Vendor {
            id: None,
            name: name.to_string(),
            contact_person: None,
            email: Some("orders@acme.test".to_string()),
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_encode_omits_missing_id() {
        let row = encode(&vendor("Acme")).unwrap();
        assert!(!row.contains_key("id"));
        assert_eq!(row["name"], json!("Acme"));
        assert_eq!(row["phone"], Value::Null);
    }

    #[test]
    fn test_decode_reports_table() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        let err = decode::<Vendor>(row).unwrap_err();
        assert!(matches!(err, DbError::Decode { table: Table::Vendors, .. }));
    }

    #[test]
    fn test_column_names() {
        assert!(validate_column("received_quantity").is_ok());
        assert!(validate_column("_x1").is_ok());
        assert!(validate_column("").is_err());
        assert!(validate_column("1st").is_err());
        assert!(validate_column("name\"; DROP TABLE vendors; --").is_err());
    }

    #[tokio::test]
    async fn test_insert_validates_first() {
        let store = MemoryStore::new();
        let err = store.insert(&vendor("  ")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(store.find_all::<Vendor>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_dyn_store() {
        let store: std::sync::Arc<dyn RecordStore> = std::sync::Arc::new(MemoryStore::new());

        let id = store.insert(&vendor("Acme")).await.unwrap();
        let found: Vendor = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.name, "Acme");

        let patched = store
            .patch::<Vendor>(id, patch_of([("phone", json!("555-0100"))]))
            .await
            .unwrap();
        assert!(patched);
        let found: Vendor = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.phone.as_deref(), Some("555-0100"));

        assert!(store.delete::<Vendor>(id).await.unwrap());
        assert!(store.find_by_id::<Vendor>(id).await.unwrap().is_none());
        assert!(!store.delete::<Vendor>(id).await.unwrap());
    }

    /// Behaviour every backend must share.
    async fn exercise_crud(store: &dyn RecordStore) {
        let first = store.insert(&vendor("Acme")).await.unwrap();
        let second = store.insert(&vendor("Bolt Supply")).await.unwrap();
        assert!(second > first);

        let all: Vec<Vendor> = store.find_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Bolt Supply"]);

        // Full replace keeps the id
        let mut renamed = vendor("Acme Industrial");
        renamed.id = Some(999);
        assert!(store.update(first, &renamed).await.unwrap());
        let found: Vendor = store.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(found.id, Some(first));
        assert_eq!(found.name, "Acme Industrial");
        assert!(store.find_by_id::<Vendor>(999).await.unwrap().is_none());

        assert!(store.patch::<Vendor>(first, Row::new()).await.unwrap());
        assert!(!store.patch::<Vendor>(999, Row::new()).await.unwrap());
        assert!(!store
            .patch::<Vendor>(999, patch_of([("phone", json!("555-0100"))]))
            .await
            .unwrap());
        let err = store
            .patch::<Vendor>(first, patch_of([("bad column", json!(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidColumn(_)));

        let mut explicit = encode(&vendor("Cobalt")).unwrap();
        explicit.insert("id".to_string(), json!(42));
        assert_eq!(store.insert_row(Table::Vendors, explicit).await.unwrap(), 42);
        let found: Vendor = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(found.name, "Cobalt");

        assert!(store.delete::<Vendor>(second).await.unwrap());
        assert!(!store.delete::<Vendor>(second).await.unwrap());
        assert!(store.find_row(Table::Vendors, second).await.unwrap().is_none());

        let ids: Vec<Option<i64>> = store
            .find_all::<Vendor>()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![Some(first), Some(42)]);
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        exercise_crud(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_crud() {
        let db = crate::pool::Database::new(crate::pool::DbConfig::in_memory())
            .await
            .unwrap();
        exercise_crud(&db.store()).await;
    }
}
