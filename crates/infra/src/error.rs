//! Error surface of the ledger and query services.

use thiserror::Error;

use arka_core::{DomainError, ProductId};

use crate::audit::AuditError;
use crate::store::StoreError;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation error.
///
/// Domain failures (`NotFound`, `InvalidArgument`, `Conflict`,
/// `InsufficientStock`) arrive as `LedgerError::Domain`. Store uniqueness and
/// revision failures are folded into `DomainError::Conflict`; whatever is left
/// is an infrastructure failure of a collaborator.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),

    /// The audit append failed and the write it belonged to was undone.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The audit append failed and undoing the write failed too: the stored
    /// product no longer matches its history.
    #[error("product {product} left without an audit entry: {audit}; undo failed: {store}")]
    Unaudited {
        product: ProductId,
        audit: AuditError,
        store: StoreError,
    },
}

impl LedgerError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            LedgerError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateName(name) => LedgerError::Domain(DomainError::conflict(
                format!("product '{name}' already exists"),
            )),
            StoreError::Concurrency(msg) => LedgerError::Domain(DomainError::conflict(msg)),
            other => LedgerError::Store(other),
        }
    }
}
