use curator_core::UserId;
use curator_events::DomainEvent;
use curator_observability::CorrelationId;
use curator_persistence::Session;

use crate::error::AppError;

/// Everything one request carries through the pipeline.
///
/// The session is present only while the transaction stage is running.
/// Outbound events queue here and leave only after a successful commit.
#[derive(Debug)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    caller: UserId,
    session: Option<Session>,
    outbox: Vec<DomainEvent>,
}

impl RequestContext {
    pub fn new(caller: UserId) -> Self {
        Self::with_correlation_id(caller, CorrelationId::new())
    }

    pub fn with_correlation_id(caller: UserId, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            caller,
            session: None,
            outbox: Vec::new(),
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn caller(&self) -> UserId {
        self.caller
    }

    /// The open session. Handlers below the transaction stage always have one.
    pub fn session(&mut self) -> Result<&mut Session, AppError> {
        self.session
            .as_mut()
            .ok_or_else(|| AppError::ConsistencyViolation("no session is open for this request".into()))
    }

    pub(crate) fn attach(&mut self, session: Session) -> Result<(), AppError> {
        if self.session.is_some() {
            return Err(AppError::ConsistencyViolation("a session is already open for this request".into()));
        }
        self.session = Some(session);
        Ok(())
    }

    pub(crate) fn detach(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn queue_event(&mut self, event: impl Into<DomainEvent>) {
        self.outbox.push(event.into());
    }

    pub fn queued_events(&self) -> &[DomainEvent] {
        &self.outbox
    }

    pub(crate) fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.outbox)
    }
}
