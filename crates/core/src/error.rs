//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic, locally-raised condition. Infrastructure
/// failures (poisoned locks, unavailable stores) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A product, category or brand reference does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value failed validation (negative quantity, non-positive amount, blank name...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A uniqueness or revision conflict (duplicate product name, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A reduction asked for more units than the product currently holds.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(product: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product: product.into(),
            requested,
            available,
        }
    }
}
