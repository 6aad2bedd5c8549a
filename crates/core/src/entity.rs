//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Users, customers, products and orders all implement this; the in-memory
/// store keys its tables by `Entity::id`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
