use async_trait::async_trait;
use tracing::Instrument;

use crate::context::RequestContext;
use crate::error::AppError;

use super::{Command, CommandHandler};

/// Outermost stage: one span per request, a start and end event, and a typed
/// diagnostic for every failure. Errors are always returned to the caller.
#[derive(Debug, Clone)]
pub struct Logging<H> {
    inner: H,
}

impl<H> Logging<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for Logging<H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError> {
        let span = tracing::info_span!(
            "command",
            command = C::NAME,
            correlation_id = %ctx.correlation_id(),
            caller = %ctx.caller()
        );

        async {
            tracing::info!("command started");
            match self.inner.handle(ctx, command).await {
                Ok(output) => {
                    tracing::info!("command completed");
                    Ok(output)
                }
                Err(err @ AppError::ConsistencyViolation(_)) => {
                    tracing::error!(error.code = err.code(), error = %err, "command aborted on a broken invariant");
                    Err(err)
                }
                Err(err) => {
                    tracing::warn!(error.code = err.code(), error = %err, "command failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}
