//! Category/brand reference checks consumed by the ledger.

pub mod in_memory;

use std::sync::Arc;

use arka_catalog::Category;
use arka_core::{BrandId, CategoryId};

pub use in_memory::InMemoryCatalog;

/// Confirms that category/brand references resolve before a product is
/// created or updated. Category and brand CRUD live behind this boundary.
pub trait CatalogValidator: Send + Sync {
    fn category_exists(&self, id: &CategoryId) -> bool;

    fn brand_exists(&self, id: &BrandId) -> bool;

    /// Look a category up by its (unique) name.
    fn category_by_name(&self, name: &str) -> Option<Category>;
}

impl<C> CatalogValidator for Arc<C>
where
    C: CatalogValidator + ?Sized,
{
    fn category_exists(&self, id: &CategoryId) -> bool {
        (**self).category_exists(id)
    }

    fn brand_exists(&self, id: &BrandId) -> bool {
        (**self).brand_exists(id)
    }

    fn category_by_name(&self, name: &str) -> Option<Category> {
        (**self).category_by_name(name)
    }
}
