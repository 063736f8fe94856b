//! Low-stock reporting, scheduled or on demand.
//!
//! Rendering (PDF), archiving and notification delivery are external
//! collaborators behind `LowStockReportSink`. A failing sink never affects the
//! ledger.

pub mod low_stock_runner;

pub use low_stock_runner::{
    generate_report, InMemoryLowStockSink, LowStockReport, LowStockReportRunner,
    LowStockReportRunnerHandle, LowStockReportSink, ReportError,
};
