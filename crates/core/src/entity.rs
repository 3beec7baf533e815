//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identities are totally ordered so change sets can be walked
/// deterministically at commit time.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy
        + Eq
        + Ord
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync
        + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
