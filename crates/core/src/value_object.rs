//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects carry no identity and are compared by their attribute values.
/// `Price` and a single batch `StockAdjustment` are value objects; a `Product`
/// is not (two products with identical fields are still different products).
///
/// Value objects are immutable: to "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
