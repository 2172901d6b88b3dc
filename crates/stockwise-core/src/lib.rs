//! # stockwise-core: Pure Business Logic for Stockwise
//!
//! Everything the purchasing and inventory workflows compute, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Front end (desktop / web / mobile)                 │   │
//! │  │    Purchase orders ──► Goods receipt ──► Stock ──► Reports      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockwise-db services + RecordStore                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockwise-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ totals  │ │ costing  │ │numbering│ │   │
//! │  │   │ entities│ │  Money  │ │ lines & │ │ weighted │ │ PO-0001 │ │   │
//! │  │   │  Table  │ │ TaxRate │ │documents│ │ average  │ │         │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities, the [`Entity`] trait and the [`Table`] catalogue
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Line and document totals
//! - [`costing`] - Weighted-average inventory cost
//! - [`numbering`] - Prefixed document number formatting/parsing
//! - [`reports`] - Reducers behind the dashboard and reports
//! - [`config`] - Explicit application configuration
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockwise_core::money::Money;
//! use stockwise_core::totals::{LineInput, LineTotals};
//! use stockwise_core::types::{TaxMode, TaxRate};
//!
//! // 2 × 100.00, 10% discount, 18% tax (tax applies after discount)
//! let line = LineTotals::compute(
//!     &LineInput {
//!         quantity: 2,
//!         unit_price: Money::from_cents(10_000),
//!         discount_bps: 1_000,
//!         tax_rate: TaxRate::from_bps(1_800),
//!     },
//!     TaxMode::Exclusive,
//! );
//! assert_eq!(line.total.cents(), 21_240);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod costing;
pub mod error;
pub mod money;
pub mod numbering;
pub mod reports;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::AppConfig;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines on a single purchase order or GRN.
pub const MAX_DOCUMENT_LINES: usize = 100;

/// Maximum quantity on a single document line.
///
/// Guards against typos (1000000 instead of 100) rather than any storage limit.
pub const MAX_LINE_QUANTITY: i64 = 999_999;

/// Maximum unit cost, price or charge in minor units (100,000,000.00).
///
/// Together with [`MAX_LINE_QUANTITY`] and [`MAX_DOCUMENT_LINES`] this keeps
/// every document total inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// The settings table holds exactly one row with this id.
pub const SETTINGS_ROW_ID: i64 = 1;

/// Default zero-padding for document sequence numbers (`PO-00001`).
pub const DEFAULT_NUMBER_WIDTH: usize = 5;
