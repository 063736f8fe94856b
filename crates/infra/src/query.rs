//! Read-only inventory views over the product store.

use tracing::debug;

use arka_catalog::Product;
use arka_core::{DomainError, ProductId};

use crate::catalog::CatalogValidator;
use crate::error::LedgerResult;
use crate::store::ProductStore;

/// Source of low-stock snapshots for the reporting runner.
pub trait LowStockSource: Send + Sync + 'static {
    fn low_stock(&self, threshold: i64) -> LedgerResult<Vec<Product>>;
}

/// Read-only projection over `ProductStore`. No side effects.
#[derive(Debug)]
pub struct InventoryQuery<S, C> {
    store: S,
    catalog: C,
}

impl<S, C> InventoryQuery<S, C>
where
    S: ProductStore,
    C: CatalogValidator,
{
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Products whose quantity is strictly below `threshold`, in no particular order.
    ///
    /// Any threshold is accepted; `threshold <= 0` simply matches nothing.
    pub fn low_stock(&self, threshold: i64) -> LedgerResult<Vec<Product>> {
        let products: Vec<Product> = self
            .store
            .find_all()?
            .into_iter()
            .filter(|p| p.is_below(threshold))
            .collect();
        debug!(threshold, matched = products.len(), "low stock query");
        Ok(products)
    }

    pub fn all_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.store.find_all()?)
    }

    /// Batch lookup; unknown ids are skipped.
    pub fn products_by_ids(&self, ids: &[ProductId]) -> LedgerResult<Vec<Product>> {
        Ok(self.store.find_all_by_id(ids)?)
    }

    /// Products of the category called `category_name`.
    pub fn products_by_category(&self, category_name: &str) -> LedgerResult<Vec<Product>> {
        if category_name.trim().is_empty() {
            return Err(DomainError::invalid_argument("category name cannot be empty").into());
        }
        let category = self
            .catalog
            .category_by_name(category_name)
            .ok_or_else(|| DomainError::not_found(format!("category '{category_name}'")))?;

        Ok(self
            .store
            .find_all()?
            .into_iter()
            .filter(|p| p.category() == category.id)
            .collect())
    }
}

impl<S, C> LowStockSource for InventoryQuery<S, C>
where
    S: ProductStore + 'static,
    C: CatalogValidator + 'static,
{
    fn low_stock(&self, threshold: i64) -> LedgerResult<Vec<Product>> {
        InventoryQuery::low_stock(self, threshold)
    }
}
