use async_trait::async_trait;

use curator_events::AchievementUnlocked;

use crate::context::RequestContext;
use crate::error::AppError;

use super::{Command, CommandHandler, CommandOutput};

/// Queues an [`AchievementUnlocked`] event when the use case reports one.
///
/// The achievement is read back through the session first; if it cannot be
/// found the write was lost and the request fails.
#[derive(Debug, Clone)]
pub struct AchievementCallback<H> {
    inner: H,
}

impl<H> AchievementCallback<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for AchievementCallback<H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError> {
        let output = self.inner.handle(ctx, command).await?;
        let Some(id) = output.achievement_id() else {
            return Ok(output);
        };

        let achievement = ctx
            .session()?
            .achievements()
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("achievement", id))?;

        tracing::info!(achievement_id = %id, milestone = %achievement.achieved, "achievement unlocked");
        ctx.queue_event(AchievementUnlocked::from(&achievement));
        Ok(output)
    }
}
