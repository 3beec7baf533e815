use chrono::{DateTime, Utc};

/// A fact that happened in the domain.
///
/// Events are immutable and versioned; consumers may see the same event more
/// than once and must treat it idempotently.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "achievement.unlocked").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
