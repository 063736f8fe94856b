//! Append-only stock history.

pub mod in_memory;
pub mod trail;

pub use in_memory::InMemoryAuditTrail;
pub use trail::{AuditError, AuditTrail};
