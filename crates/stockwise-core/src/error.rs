//! # Error Types
//!
//! Domain-specific error types for stockwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockwise-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockwise-db errors                                                   │
//! │  ├── DbError          - Record store failures                          │
//! │  └── ServiceError     - What callers see (with an ErrorCode)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← DbError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the purchasing and inventory workflows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Purchase order cannot be found.
    #[error("Purchase order not found: {0}")]
    PurchaseOrderNotFound(i64),

    /// A receipt line points at an item that is not part of the order.
    #[error("Item {item_id} is not on purchase order {order_id}")]
    ItemNotOnOrder { item_id: i64, order_id: i64 },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Receiving against a cancelled or fully received order
    /// - Cancelling or deleting an order that already has receipts
    #[error("Purchase order {order_number} is {status}, cannot {operation}")]
    InvalidOrderStatus {
        order_number: String,
        status: String,
        operation: String,
    },

    /// Accepting more than is still outstanding on an order line.
    ///
    /// ## User Workflow
    /// ```text
    /// PO line: ordered 10, received so far 6
    ///      │
    ///      ▼
    /// GRN line: accepted 5
    ///      │
    ///      ▼
    /// OverReceipt { item_id, outstanding: 4, requested: 5 }
    /// ```
    #[error("Cannot accept {requested} for item {item_id}: only {outstanding} outstanding")]
    OverReceipt {
        item_id: i64,
        outstanding: i64,
        requested: i64,
    },

    /// Document has no lines.
    #[error("{document} must have at least one line")]
    EmptyDocument { document: String },

    /// Stock adjustment would drive available stock below zero.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a SKU with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Accepted and rejected quantities exceed what was physically received.
    #[error("accepted ({accepted}) + rejected ({rejected}) exceeds received ({received})")]
    QuantityMismatch {
        accepted: i64,
        rejected: i64,
        received: i64,
    },

    /// Duplicate value (e.g. the same order line twice on one GRN).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
