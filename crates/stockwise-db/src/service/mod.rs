//! # Domain Services
//!
//! Purchasing and inventory operations composed from record-store calls.
//!
//! ## Service Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PurchasesService   vendors, purchase orders, GRN receipt               │
//! │  InventoryService   branches, products, stock positions, adjustments    │
//! │  DashboardService   headline numbers                                    │
//! │  ReportsService     valuation, ledger, vendor summary, receiving        │
//! │  SettingsService    company settings row, AppConfig                     │
//! │                                                                         │
//! │  each holds Arc<dyn RecordStore> (+ AppConfig where needed)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-record writes go through a [`UnitOfWork`]: on failure its journal is
//! replayed backwards and the original error is returned.
//!
//! Everything that rewrites a stock position (GRN receipt, adjustment) holds
//! the same [`StockLock`] from the position read until commit or rollback.

pub mod dashboard;
pub mod error;
pub mod inventory;
pub mod purchases;
pub mod reports;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

use crate::store::{RecordStore, UnitOfWork};
use stockwise_core::AppConfig;

pub use dashboard::DashboardService;
pub use error::{ErrorCode, ErrorResponse, ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use purchases::PurchasesService;
pub use reports::ReportsService;
pub use settings::SettingsService;

/// Serializes read-modify-write of inventory positions.
///
/// Services built by [`Services::new`] share one; a service built on its own
/// gets a private lock unless given one with `with_stock_lock`.
pub type StockLock = Arc<Mutex<()>>;

/// Every service over one store and configuration.
pub struct Services {
    pub purchases: PurchasesService,
    pub inventory: InventoryService,
    pub dashboard: DashboardService,
    pub reports: ReportsService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        let stock_lock = StockLock::default();
        Services {
            purchases: PurchasesService::new(store.clone(), config.clone())
                .with_stock_lock(stock_lock.clone()),
            inventory: InventoryService::new(store.clone(), config).with_stock_lock(stock_lock),
            dashboard: DashboardService::new(store.clone()),
            reports: ReportsService::new(store.clone()),
            settings: SettingsService::new(store),
        }
    }
}

/// Commits on success; rolls back and returns the original error otherwise.
///
/// A failed rollback becomes [`ServiceError::RollbackFailed`] carrying both
/// messages.
pub(crate) async fn finish<T>(uow: UnitOfWork, outcome: ServiceResult<T>) -> ServiceResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit();
            Ok(value)
        }
        Err(original) => match uow.rollback().await {
            Ok(()) => Err(original),
            Err(rollback) => {
                error!(error = %original, rollback = %rollback, "Rollback failed");
                Err(ServiceError::RollbackFailed {
                    original: original.to_string(),
                    rollback: rollback.to_string(),
                })
            }
        },
    }
}
