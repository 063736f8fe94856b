use std::sync::Arc;

use thiserror::Error;

use arka_catalog::Product;
use arka_core::ProductId;

/// Product store operation error.
///
/// These are **infrastructure errors** (storage, revisions, uniqueness
/// constraints) as opposed to domain errors. The ledger maps the first two onto
/// `DomainError::Conflict`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another product already owns this name.
    #[error("product name '{0}' is already taken")]
    DuplicateName(String),

    /// The saved product was read at an older revision than the stored one.
    #[error("stale product revision: {0}")]
    Concurrency(String),

    /// The backing storage could not be used (poisoned lock, lost connection...).
    #[error("product store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for `Product` records, keyed by surrogate id and by unique name.
///
/// Implementations must:
/// - enforce name uniqueness atomically on `save` (`StoreError::DuplicateName`)
/// - reject a `save` whose revision does not match the stored one
///   (`StoreError::Concurrency`), and return the product at its new revision
pub trait ProductStore: Send + Sync {
    fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// Batch lookup. Ids that do not resolve are skipped.
    fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    fn exists_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Insert or update a product.
    fn save(&self, product: Product) -> Result<Product, StoreError>;

    fn delete(&self, product: &Product) -> Result<(), StoreError>;

    fn find_all(&self) -> Result<Vec<Product>, StoreError>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        (**self).find_by_name(name)
    }

    fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        (**self).find_all_by_id(ids)
    }

    fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        (**self).exists_by_name(name)
    }

    fn save(&self, product: Product) -> Result<Product, StoreError> {
        (**self).save(product)
    }

    fn delete(&self, product: &Product) -> Result<(), StoreError> {
        (**self).delete(product)
    }

    fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).find_all()
    }
}
