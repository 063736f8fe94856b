//! Stock ledger: the only writer of product quantities.

pub mod locks;
pub mod stock_ledger;

pub use locks::ProductLocks;
pub use stock_ledger::StockLedger;
