use std::sync::Arc;

use async_trait::async_trait;

use curator_auth::PermissionCache;
use curator_events::{EventEnvelope, EventPublisher};
use curator_persistence::{DocumentStore, LockFactory, Session};

use crate::context::RequestContext;
use crate::error::AppError;

use super::{Command, CommandHandler};

/// Runs the rest of the pipeline inside one session.
///
/// On success the session is committed, cached permission bits of every
/// written user are refreshed, and queued events are published. On failure
/// the session is aborted and queued events are dropped.
pub struct Transactional<H> {
    inner: H,
    store: Arc<dyn DocumentStore>,
    locks: Arc<dyn LockFactory>,
    cache: Arc<dyn PermissionCache>,
    publisher: Arc<dyn EventPublisher>,
}

impl<H> Transactional<H> {
    pub fn new(
        inner: H,
        store: Arc<dyn DocumentStore>,
        locks: Arc<dyn LockFactory>,
        cache: Arc<dyn PermissionCache>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            inner,
            store,
            locks,
            cache,
            publisher,
        }
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for Transactional<H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError> {
        let session = Session::begin(self.store.as_ref(), Arc::clone(&self.locks)).await?;
        ctx.attach(session)?;

        let outcome = self.inner.handle(ctx, command).await;
        let session = ctx
            .detach()
            .ok_or_else(|| AppError::ConsistencyViolation("session vanished during the request".into()))?;

        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                ctx.take_events();
                if let Err(abort_err) = session.abort().await {
                    tracing::warn!(error = %abort_err, "abort failed");
                }
                return Err(err);
            }
        };

        let report = match session.commit().await {
            Ok(report) => report,
            Err(err) => {
                ctx.take_events();
                return Err(err.into());
            }
        };
        tracing::debug!(writes = report.total_writes(), "transaction committed");

        for user in &report.users {
            self.cache.put(user.id, user.permissions);
        }

        for event in ctx.take_events() {
            let envelope = EventEnvelope::wrap(ctx.correlation_id().into(), event);
            tracing::info!(event_type = envelope.event_type(), event_id = %envelope.event_id(), "publishing event");
            self.publisher.publish(envelope)?;
        }

        Ok(output)
    }
}
