//! Publish/subscribe plumbing for outbound events.
//!
//! [`EventPublisher`] is the collaborator the application calls after a
//! commit. [`EventBus`] is the fan-out mechanism behind in-process publishers;
//! delivery is at-least-once, so subscribers must be idempotent.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::domain::DomainEvent;
use crate::envelope::EventEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event bus unavailable")]
    Unavailable,

    #[error("event transport failed: {0}")]
    Transport(String),
}

/// Outbound publication of committed domain events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, envelope: EventEnvelope<DomainEvent>) -> Result<(), PublishError>;
}

impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher + ?Sized,
{
    fn publish(&self, envelope: EventEnvelope<DomainEvent>) -> Result<(), PublishError> {
        (**self).publish(envelope)
    }
}

/// A subscription receiving every message published after it was opened.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Broadcast bus: each subscriber gets a copy of every published message.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
