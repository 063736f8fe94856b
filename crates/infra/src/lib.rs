//! Infrastructure layer: stock ledger, stores, audit trail, queries and reporting.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod query;
pub mod reporting;
pub mod store;


pub use audit::{AuditError, AuditTrail, InMemoryAuditTrail};
pub use catalog::{CatalogValidator, InMemoryCatalog};
pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::StockLedger;
pub use query::{InventoryQuery, LowStockSource};
pub use reporting::{generate_report, LowStockReport, LowStockReportRunner, LowStockReportSink};
pub use store::{InMemoryProductStore, ProductStore, StoreError};
