use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arka_core::ProductId;

/// Per-product mutual exclusion, keyed by product identity.
///
/// Mutations of the same product queue on that product's slot; mutations of
/// different products never share a lock. The registry mutex is only held
/// while a slot is looked up, never while a product is being mutated.
#[derive(Debug, Default)]
pub struct ProductLocks {
    slots: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock slot of `id`, created on first use.
    pub fn slot(&self, id: ProductId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id).or_default().clone()
    }

    /// Lock a slot.
    ///
    /// The slot guards no data (product state lives in the store), so a
    /// poisoned slot is still usable.
    pub fn acquire(slot: &Mutex<()>) -> MutexGuard<'_, ()> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the slot of a deleted product.
    pub fn forget(&self, id: &ProductId) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(id);
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
