//! # Unit of Work
//!
//! Groups several record-store writes so they can be undone together.
//!
//! ## How Rollback Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  write through the unit of work     journal entry                       │
//! │  ──────────────────────────────     ──────────────────────────          │
//! │  insert_row(t, row) → id            Delete   { t, id }                  │
//! │  update_row(t, id, patch)           Restore  { t, id, previous row }    │
//! │  delete_row(t, id)                  Reinsert { t, previous row }        │
//! │                                                                         │
//! │  commit()   → journal dropped                                           │
//! │  rollback() → journal replayed newest → oldest                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Compensation rather than SQL transactions, so the same workflow code runs
//! against every backend. Rollback only covers failures observed by this
//! process; a crash between two writes leaves the earlier writes in place.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{RecordStore, Row};
use crate::error::{DbError, DbResult};
use stockwise_core::Table;

#[derive(Debug)]
enum Compensation {
    Delete { table: Table, id: i64 },
    Restore { table: Table, id: i64, row: Row },
    Reinsert { table: Table, row: Row },
}

/// A journaling wrapper around a shared store.
///
/// Reads pass straight through. Every successful write records how to undo
/// it. Finish with [`UnitOfWork::commit`] or [`UnitOfWork::rollback`].
pub struct UnitOfWork {
    store: Arc<dyn RecordStore>,
    journal: Mutex<Vec<Compensation>>,
}

impl UnitOfWork {
    pub fn begin(store: Arc<dyn RecordStore>) -> Self {
        UnitOfWork {
            store,
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Number of journaled writes.
    pub async fn len(&self) -> usize {
        self.journal.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.journal.lock().await.is_empty()
    }

    /// Keeps every write.
    pub fn commit(mut self) {
        let steps = std::mem::take(self.journal.get_mut()).len();
        debug!(steps, "Unit of work committed");
    }

    /// Undoes every write, newest first.
    ///
    /// Keeps going after a failed step so as much as possible is undone, then
    /// reports every failure in one [`DbError::RollbackFailed`].
    pub async fn rollback(mut self) -> DbResult<()> {
        let journal = std::mem::take(self.journal.get_mut());
        warn!(steps = journal.len(), "Rolling back unit of work");

        let mut failures = Vec::new();
        for step in journal.into_iter().rev() {
            if let Err(e) = self.undo(&step).await {
                error!(?step, error = %e, "Compensation failed");
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DbError::RollbackFailed(failures.join("; ")))
        }
    }

    async fn undo(&self, step: &Compensation) -> DbResult<()> {
        match step {
            Compensation::Delete { table, id } => {
                self.store.delete_row(*table, *id).await?;
            }
            Compensation::Restore { table, id, row } => {
                let mut previous = row.clone();
                previous.remove("id");
                self.store.update_row(*table, *id, previous).await?;
            }
            Compensation::Reinsert { table, row } => {
                self.store.insert_row(*table, row.clone()).await?;
            }
        }
        Ok(())
    }

    async fn record(&self, step: Compensation) {
        self.journal.lock().await.push(step);
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        let pending = self.journal.get_mut().len();
        if pending > 0 {
            warn!(pending, "Unit of work dropped without commit or rollback");
        }
    }
}

#[async_trait]
impl RecordStore for UnitOfWork {
    async fn find_all_rows(&self, table: Table) -> DbResult<Vec<Row>> {
        self.store.find_all_rows(table).await
    }

    async fn find_row(&self, table: Table, id: i64) -> DbResult<Option<Row>> {
        self.store.find_row(table, id).await
    }

    async fn insert_row(&self, table: Table, row: Row) -> DbResult<i64> {
        let id = self.store.insert_row(table, row).await?;
        self.record(Compensation::Delete { table, id }).await;
        Ok(id)
    }

    async fn update_row(&self, table: Table, id: i64, patch: Row) -> DbResult<bool> {
        let Some(previous) = self.store.find_row(table, id).await? else {
            return Ok(false);
        };
        let updated = self.store.update_row(table, id, patch).await?;
        if updated {
            self.record(Compensation::Restore {
                table,
                id,
                row: previous,
            })
            .await;
        }
        Ok(updated)
    }

    async fn delete_row(&self, table: Table, id: i64) -> DbResult<bool> {
        let Some(previous) = self.store.find_row(table, id).await? else {
            return Ok(false);
        };
        let deleted = self.store.delete_row(table, id).await?;
        if deleted {
            self.record(Compensation::Reinsert {
                table,
                row: previous,
            })
            .await;
        }
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
