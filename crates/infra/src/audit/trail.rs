use std::sync::Arc;

use thiserror::Error;

use arka_catalog::StockHistoryEntry;
use arka_core::ProductId;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit trail unavailable: {0}")]
    Unavailable(String),
}

/// Durable, append-only log of accepted stock changes.
///
/// `record` does no validation: the ledger only calls it for mutations it has
/// already accepted. Entries are never edited; the only removal is the cascade
/// cleanup when a product is deleted.
pub trait AuditTrail: Send + Sync {
    /// Append one entry, assigning identity, sequence and server timestamp.
    fn record(
        &self,
        product_id: ProductId,
        resulting_quantity: i64,
    ) -> Result<StockHistoryEntry, AuditError>;

    /// Entries of one product, oldest first.
    fn entries_for(&self, product_id: &ProductId) -> Result<Vec<StockHistoryEntry>, AuditError>;

    /// Drop every entry of a deleted product. Returns how many were removed.
    fn purge_product(&self, product_id: &ProductId) -> Result<usize, AuditError>;
}

impl<A> AuditTrail for Arc<A>
where
    A: AuditTrail + ?Sized,
{
    fn record(
        &self,
        product_id: ProductId,
        resulting_quantity: i64,
    ) -> Result<StockHistoryEntry, AuditError> {
        (**self).record(product_id, resulting_quantity)
    }

    fn entries_for(&self, product_id: &ProductId) -> Result<Vec<StockHistoryEntry>, AuditError> {
        (**self).entries_for(product_id)
    }

    fn purge_product(&self, product_id: &ProductId) -> Result<usize, AuditError> {
        (**self).purge_product(product_id)
    }
}
