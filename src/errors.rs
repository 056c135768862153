use sea_orm::error::DbErr;

use crate::stock::StockError;

/// Service-level error taxonomy.
///
/// `ValidationError` and `InsufficientStock` are expected business
/// conditions reported synchronously to the caller. `InvariantViolation`
/// means the bookkeeping itself is broken (a compensation step failed after
/// a decrement succeeded) and must never be treated as an ordinary business
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<StockError> for ServiceError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Insufficient { .. } => ServiceError::InsufficientStock(err.to_string()),
            StockError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            StockError::Database(db_err) => ServiceError::DatabaseError(db_err),
        }
    }
}

impl ServiceError {
    /// True for errors a caller can recover from by correcting its input or
    /// waiting for stock to change; false for errors that indicate the
    /// system itself needs attention.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::ValidationError(_)
                | ServiceError::InsufficientStock(_)
                | ServiceError::NotFound(_)
        )
    }
}
