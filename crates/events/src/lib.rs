//! Outbound domain events.
//!
//! Events are produced by use cases, queued on the request, and handed to an
//! [`EventPublisher`] only after the request's transaction has committed.

pub mod bus;
pub mod domain;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, EventPublisher, PublishError, Subscription};
pub use domain::{AchievementUnlocked, DomainEvent};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
