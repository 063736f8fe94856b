use serde::{Deserialize, Serialize};

use arka_core::{ProductId, ValueObject};

/// One line of a batch adjustment: move `amount` units for `product_id`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub amount: i64,
}

impl ValueObject for StockAdjustment {}

/// Batch adjustment: an insertion-ordered map from product to amount.
///
/// Amounts are not validated here; the ledger checks each entry as it applies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockAdjustments {
    entries: Vec<StockAdjustment>,
}

impl StockAdjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the amount for `product_id`.
    ///
    /// Like a map insert: an existing entry keeps its position and gets the new
    /// amount, which is returned as the old value.
    pub fn insert(&mut self, product_id: ProductId, amount: i64) -> Option<i64> {
        match self.entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(existing) => Some(core::mem::replace(&mut existing.amount, amount)),
            None => {
                self.entries.push(StockAdjustment { product_id, amount });
                None
            }
        }
    }

    pub fn with(mut self, product_id: ProductId, amount: i64) -> Self {
        self.insert(product_id, amount);
        self
    }

    pub fn get(&self, product_id: &ProductId) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| &e.product_id == product_id)
            .map(|e| e.amount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StockAdjustment> {
        self.entries.iter()
    }
}

impl FromIterator<(ProductId, i64)> for StockAdjustments {
    fn from_iter<I: IntoIterator<Item = (ProductId, i64)>>(iter: I) -> Self {
        let mut adjustments = Self::new();
        for (product_id, amount) in iter {
            adjustments.insert(product_id, amount);
        }
        adjustments
    }
}

impl<'a> IntoIterator for &'a StockAdjustments {
    type Item = &'a StockAdjustment;
    type IntoIter = core::slice::Iter<'a, StockAdjustment>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
