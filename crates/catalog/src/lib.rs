//! Catalog domain module.
//!
//! Products, their categories and brands, stock history entries and batch
//! adjustments. Pure, deterministic domain logic (no IO, no HTTP, no storage).
//! The stock invariant (`quantity >= 0`) lives on `Product`.

pub mod adjustment;
pub mod category;
pub mod history;
pub mod product;

pub use adjustment::{StockAdjustment, StockAdjustments};
pub use category::{Brand, Category};
pub use history::StockHistoryEntry;
pub use product::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, NewProduct, Price, Product, ProductPatch, ProductView,
};
