//! # Service Errors
//!
//! What service callers see, plus a stable [`ErrorCode`] a front end can
//! branch on.
//!
//! ## Code Mapping
//! ```text
//! ValidationError / UniqueViolation / FK violation   → VALIDATION_ERROR
//! NotFound / PurchaseOrderNotFound                    → NOT_FOUND
//! other CoreError (status, over-receipt, stock)       → BUSINESS_RULE
//! other DbError                                       → DATABASE_ERROR
//! RollbackFailed                                      → INTERNAL
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::error::DbError;
use stockwise_core::{CoreError, ValidationError};

/// Errors returned by every service method.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule or validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Record store failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A workflow failed and undoing its earlier writes failed too.
    ///
    /// The database may hold a partial document; both messages are kept for
    /// the operator.
    #[error("{original} (rollback also failed: {rollback})")]
    RollbackFailed { original: String, rollback: String },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    BusinessRule,
    DatabaseError,
    Internal,
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            ServiceError::Core(CoreError::PurchaseOrderNotFound(_)) => ErrorCode::NotFound,
            ServiceError::Core(_) => ErrorCode::BusinessRule,
            ServiceError::Db(DbError::NotFound { .. }) => ErrorCode::NotFound,
            ServiceError::Db(
                DbError::Validation(_)
                | DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. },
            ) => ErrorCode::ValidationError,
            ServiceError::Db(_) => ErrorCode::DatabaseError,
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::RollbackFailed { .. } => ErrorCode::Internal,
        }
    }
}

/// Serializable error body for a UI or IPC layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let message = match err {
            // Driver detail stays in the log
            ServiceError::Db(
                DbError::QueryFailed(detail) | DbError::Internal(detail),
            ) => {
                tracing::error!(error = %detail, "Database operation failed");
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            code: err.code(),
            message,
        }
    }
}

/// Result type for service methods.
pub type ServiceResult<T> = Result<T, ServiceError>;
