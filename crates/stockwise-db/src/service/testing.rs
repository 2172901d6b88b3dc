//! Shared fixtures for service tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{DbError, DbResult};
use crate::store::{RecordStore, RecordStoreExt, Row};
use stockwise_core::{Branch, Product, Table, Vendor};

/// Ids created by [`seed`].
#[derive(Debug, Clone)]
pub struct Fixture {
    pub vendor_id: i64,
    pub branch_id: i64,
    /// `WID-1` (cost 10.00) and `GAD-2` (cost 25.00, reorder level 5).
    pub product_ids: Vec<i64>,
}

pub async fn seed(store: Arc<dyn RecordStore>) -> Fixture {
    let now = Utc::now();

    let vendor_id = store
        .insert(&Vendor {
            id: None,
            name: "Acme Supplies".to_string(),
            contact_person: Some("R. Patel".to_string()),
            email: Some("orders@acme.test".to_string()),
            phone: None,
            address: None,
            created_at: now,
        })
        .await
        .unwrap();

    let branch_id = store
        .insert(&Branch {
            id: None,
            code: "MAIN".to_string(),
            name: "Main Warehouse".to_string(),
            address: None,
            created_at: now,
        })
        .await
        .unwrap();

    let mut product_ids = Vec::new();
    for (sku, name, cost, reorder) in [("WID-1", "Widget", 1_000, 0), ("GAD-2", "Gadget", 2_500, 5)] {
        let id = store
            .insert(&Product {
                id: None,
                sku: sku.to_string(),
                name: name.to_string(),
                unit: "pcs".to_string(),
                cost_cents: cost,
                price_cents: cost * 2,
                tax_rate_bps: 0,
                reorder_level: reorder,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        product_ids.push(id);
    }

    Fixture {
        vendor_id,
        branch_id,
        product_ids,
    }
}

/// Delegates to `inner`, but once armed every insert into the insert table
/// and every delete from the delete table fails.
pub struct FailingStore {
    inner: Arc<dyn RecordStore>,
    inserts: Option<Table>,
    deletes: Option<Table>,
    armed: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        FailingStore {
            inner,
            inserts: None,
            deletes: None,
            armed: AtomicBool::new(false),
        }
    }

    pub fn failing_inserts(mut self, table: Table) -> Self {
        self.inserts = Some(table);
        self
    }

    pub fn failing_deletes(mut self, table: Table) -> Self {
        self.deletes = Some(table);
        self
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn fails(&self, target: Option<Table>, table: Table) -> DbResult<()> {
        if target == Some(table) && self.armed.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed(format!("injected failure on {table}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>> {
        self.inner.find_all_rows(table).await
    }

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>> {
        self.inner.find_row(table, id).await
    }

    async fn insert_row(&self, table: Table, row: Row) -> DbResult<i64> {
        self.fails(self.inserts, table)?;
        self.inner.insert_row(table, row).await
    }

    async fn update_row(&self, table: Table, id: i64, patch: Row) -> DbResult<bool> {
        self.inner.update_row(table, id, patch).await
    }

    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool> {
        self.fails(self.deletes, table)?;
        self.inner.delete_row(table, id).await
    }
}

/// Delegates to `inner`, but once armed the next update of `table` waits
/// for [`GateStore::release`] before it is applied.
pub struct GateStore {
    inner: Arc<dyn RecordStore>,
    table: Table,
    armed: AtomicBool,
    reached: Notify,
    released: Notify,
}

impl GateStore {
    pub fn new(inner: Arc<dyn RecordStore>, table: Table) -> Self {
        GateStore {
            inner,
            table,
            armed: AtomicBool::new(false),
            reached: Notify::new(),
            released: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once an update is held at the gate.
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl RecordStore for GateStore {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>> {
        self.inner.find_all_rows(table).await
    }

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>> {
        self.inner.find_row(table, id).await
    }

    async fn insert_row(&self, table: Table, row: Row) -> DbResult<i64> {
        self.inner.insert_row(table, row).await
    }

    async fn update_row(&self, table: Table, id: i64, patch: Row) -> DbResult<bool> {
        if table == self.table && self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.released.notified().await;
        }
        self.inner.update_row(table, id, patch).await
    }

    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool> {
        self.inner.delete_row(table, id).await
    }
}
