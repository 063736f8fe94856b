//! Product persistence abstractions.

pub mod in_memory;
pub mod product_store;

pub use in_memory::InMemoryProductStore;
pub use product_store::{ProductStore, StoreError};
