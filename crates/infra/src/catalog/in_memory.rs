use std::collections::HashMap;
use std::sync::RwLock;

use arka_catalog::{Brand, Category};
use arka_core::{BrandId, CategoryId};

use super::CatalogValidator;

/// In-memory category/brand directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    categories: RwLock<HashMap<CategoryId, Category>>,
    brands: RwLock<HashMap<BrandId, Brand>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, category: Category) -> CategoryId {
        let id = category.id;
        if let Ok(mut map) = self.categories.write() {
            map.insert(id, category);
        }
        id
    }

    pub fn add_brand(&self, brand: Brand) -> BrandId {
        let id = brand.id;
        if let Ok(mut map) = self.brands.write() {
            map.insert(id, brand);
        }
        id
    }
}

impl CatalogValidator for InMemoryCatalog {
    fn category_exists(&self, id: &CategoryId) -> bool {
        self.categories
            .read()
            .map(|map| map.contains_key(id))
            .unwrap_or(false)
    }

    fn brand_exists(&self, id: &BrandId) -> bool {
        self.brands
            .read()
            .map(|map| map.contains_key(id))
            .unwrap_or(false)
    }

    fn category_by_name(&self, name: &str) -> Option<Category> {
        let map = self.categories.read().ok()?;
        map.values().find(|c| c.name == name).cloned()
    }
}
