//! # Validation Module
//!
//! Business rule validation, run before anything reaches the record store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service input (NewPurchaseOrder, CreateGrn...)               │
//! │  └── Whole-document checks before the first write                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Entity::validate (THIS MODULE)                               │
//! │  └── Run by the record store on every insert/update                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE and foreign key constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_DOCUMENT_LINES, MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Not empty, at most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use stockwise_core::validation::validate_sku;
///
/// assert!(validate_sku("BOLT-M8").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_code("sku", sku)?;
    if sku.trim().len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }
    Ok(())
}

/// Validates a short identifier-like code (branch code, SKU).
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (1-200 characters).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a document number prefix ("PO", "GRN").
///
/// Uppercase letters and digits only, 1-10 characters, so that
/// `PREFIX-00001` parses back unambiguously.
pub fn validate_prefix(field: &str, prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if prefix.len() > 10 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 10,
        });
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only uppercase letters and digits".to_string(),
        });
    }
    Ok(())
}

/// Validates a generated document number (`PO-00001`).
pub fn validate_document_number(field: &str, number: &str) -> ValidationResult<()> {
    match number.split_once('-') {
        Some((prefix, seq)) if !seq.is_empty() && seq.chars().all(|c| c.is_ascii_digit()) => {
            validate_prefix(field, prefix)
        }
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected PREFIX-NNNNN".to_string(),
        }),
    }
}

/// Validates an ISO 4217 currency code.
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency code".to_string(),
            reason: "must be three uppercase letters".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an ordered/adjusted quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a value that may be zero but never negative.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an amount in minor units (zero allowed, e.g. free samples).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE_CENTS
///
/// ```rust
/// use stockwise_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit cost", 1099).is_ok());
/// assert!(validate_price_cents("unit cost", 0).is_ok());
/// assert!(validate_price_cents("unit cost", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_non_negative(field, cents)?;
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates a line discount in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates the quantities on one GRN line.
///
/// ## Rules
/// ```text
/// received > 0
/// accepted ≥ 0, rejected ≥ 0
/// accepted + rejected ≤ received
/// ```
///
/// ```rust
/// use stockwise_core::validation::validate_receipt_quantities;
///
/// assert!(validate_receipt_quantities(10, 8, 2).is_ok());
/// assert!(validate_receipt_quantities(10, 8, 5).is_err());
/// ```
pub fn validate_receipt_quantities(
    received: i64,
    accepted: i64,
    rejected: i64,
) -> ValidationResult<()> {
    validate_quantity(received).map_err(|_| ValidationError::MustBePositive {
        field: "received quantity".to_string(),
    })?;
    validate_non_negative("accepted quantity", accepted)?;
    validate_non_negative("rejected quantity", rejected)?;

    if accepted + rejected > received {
        return Err(ValidationError::QuantityMismatch {
            accepted,
            rejected,
            received,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a document (1..=MAX_DOCUMENT_LINES).
pub fn validate_line_count(document: &str, lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: format!("{} lines", document),
        });
    }
    if lines > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: format!("{} lines", document),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
