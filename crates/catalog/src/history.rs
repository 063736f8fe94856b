use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use arka_core::{Entity, HistoryEntryId, ProductId};

/// Immutable audit record of a product's quantity right after an accepted mutation.
///
/// `changed_quantity` is the resulting quantity, not the delta. Entries are
/// ordered per product by `sequence`, which the audit trail assigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHistoryEntry {
    pub id: HistoryEntryId,
    pub sequence: u64,
    pub product_id: ProductId,
    pub changed_quantity: i64,
    pub recorded_at: DateTime<Utc>,
}

impl Entity for StockHistoryEntry {
    type Id = HistoryEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
