//! # stockwise-db: Persistence and Workflows for Stockwise
//!
//! Record stores (SQLite and in-memory), document numbering, and the services
//! that turn purchase orders and goods receipts into stock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Data Flow                              │
//! │                                                                         │
//! │  Front end (create_grn, dashboard, reports)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   service     │   │    store      │   │   pool +      │    │   │
//! │  │   │               │   │               │   │  migrations   │    │   │
//! │  │   │ Purchases     │──►│ RecordStore   │──►│ SqlitePool    │    │   │
//! │  │   │ Inventory     │   │ UnitOfWork    │   │ 001_initial   │    │   │
//! │  │   │ Dashboard     │   │ MemoryStore   │   │               │    │   │
//! │  │   │ Reports       │   │ SqliteStore   │   │               │    │   │
//! │  │   │ Settings      │   │               │   │               │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘    │   │
//! │  │          │                                                      │   │
//! │  │          ▼                                                      │   │
//! │  │   DocumentNumberGenerator (PO-00001, GRN-00001)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`store`] - The `RecordStore` trait, its backends and the unit of work
//! - [`numbering`] - Collision-free document numbers
//! - [`service`] - Purchasing, inventory, dashboard, reports and settings
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockwise_core::AppConfig;
//! use stockwise_db::{Database, DbConfig, RecordStore, Services};
//!
//! let db = Database::new(DbConfig::from_env()).await?;
//! let store: Arc<dyn RecordStore> = Arc::new(db.store());
//! let services = Services::new(store, AppConfig::from_env());
//!
//! let summary = services.dashboard.summary().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use numbering::DocumentNumberGenerator;
pub use pool::{Database, DbConfig};
pub use store::{MemoryStore, RecordStore, RecordStoreExt, Row, SqliteStore, UnitOfWork};

pub use service::{
    DashboardService, ErrorCode, ErrorResponse, InventoryService, PurchasesService,
    ReportsService, ServiceError, ServiceResult, Services, SettingsService, StockLock,
};
