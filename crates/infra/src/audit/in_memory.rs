use std::sync::RwLock;

use chrono::Utc;

use arka_catalog::StockHistoryEntry;
use arka_core::{HistoryEntryId, ProductId};

use super::trail::{AuditError, AuditTrail};

#[derive(Debug, Default)]
struct Entries {
    last_sequence: u64,
    entries: Vec<StockHistoryEntry>,
}

/// In-memory append-only audit trail.
///
/// Intended for tests/dev. Sequence numbers start at 1 and are never reused,
/// even after a purge.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    inner: RwLock<Entries>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|e| e.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> AuditError {
    AuditError::Unavailable("lock poisoned".to_string())
}

impl AuditTrail for InMemoryAuditTrail {
    fn record(
        &self,
        product_id: ProductId,
        resulting_quantity: i64,
    ) -> Result<StockHistoryEntry, AuditError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.last_sequence += 1;
        let entry = StockHistoryEntry {
            id: HistoryEntryId::new(),
            sequence: inner.last_sequence,
            product_id,
            changed_quantity: resulting_quantity,
            recorded_at: Utc::now(),
        };
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    fn entries_for(&self, product_id: &ProductId) -> Result<Vec<StockHistoryEntry>, AuditError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| &e.product_id == product_id)
            .cloned()
            .collect())
    }

    fn purge_product(&self, product_id: &ProductId) -> Result<usize, AuditError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let before = inner.entries.len();
        inner.entries.retain(|e| &e.product_id != product_id);
        Ok(before - inner.entries.len())
    }
}
