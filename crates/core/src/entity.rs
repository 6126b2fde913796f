//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Storage collaborators key their tables by `Entity::Id`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Short lowercase name used in error messages ("unit", "order", ...).
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
