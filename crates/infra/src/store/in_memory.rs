use std::collections::HashMap;
use std::sync::RwLock;

use arka_catalog::Product;
use arka_core::{AggregateRoot, ExpectedVersion, ProductId};

use super::product_store::{ProductStore, StoreError};

#[derive(Debug, Default)]
struct Products {
    by_id: HashMap<ProductId, Product>,
    by_name: HashMap<String, ProductId>,
}

/// In-memory product store.
///
/// Intended for tests/dev. A single write lock covers the id map and the name
/// index, so uniqueness and revision checks happen atomically with the write.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Products>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|p| p.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl ProductStore for InMemoryProductStore {
    fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products.by_id.get(id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products
            .by_name
            .get(name)
            .and_then(|id| products.by_id.get(id))
            .cloned())
    }

    fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(ids
            .iter()
            .filter_map(|id| products.by_id.get(id).cloned())
            .collect())
    }

    fn exists_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products.by_name.contains_key(name))
    }

    fn save(&self, product: Product) -> Result<Product, StoreError> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let products = &mut *guard;
        let id = product.id_typed();

        let current = products.by_id.get(&id);
        let current_version = current.map(|p| p.version()).unwrap_or(0);
        ExpectedVersion::Exact(product.version())
            .check(current_version)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        if let Some(owner) = products.by_name.get(product.name()) {
            if *owner != id {
                return Err(StoreError::DuplicateName(product.name().to_string()));
            }
        }

        // Rename: release the old name.
        if let Some(previous_name) = current
            .filter(|p| p.name() != product.name())
            .map(|p| p.name().to_string())
        {
            products.by_name.remove(&previous_name);
        }

        let mut stored = product;
        stored.mark_saved();
        products.by_name.insert(stored.name().to_string(), id);
        products.by_id.insert(id, stored.clone());
        Ok(stored)
    }

    fn delete(&self, product: &Product) -> Result<(), StoreError> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let products = &mut *guard;
        if let Some(removed) = products.by_id.remove(&product.id_typed()) {
            products.by_name.remove(removed.name());
        }
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products.by_id.values().cloned().collect())
    }
}
