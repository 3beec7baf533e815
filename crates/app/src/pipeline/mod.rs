//! Command processing pipeline.
//!
//! ```text
//! Logging → Authorization → Transaction → AchievementCallback → use case
//! ```
//!
//! Every stage implements the same [`CommandHandler`] contract and wraps the
//! next one, so a request flows through them in a fixed order.

mod achievements;
mod authorization;
mod logging;
mod transaction;

use std::sync::Arc;

use async_trait::async_trait;

use curator_auth::CommandAuthorization;
use curator_core::AchievementId;

use crate::context::RequestContext;
use crate::error::AppError;

pub use achievements::AchievementCallback;
pub use authorization::Authorization;
pub use logging::Logging;
pub use transaction::Transactional;

/// A request the pipeline can execute.
pub trait Command: CommandAuthorization + core::fmt::Debug + Send + Sync + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    type Output: CommandOutput;
}

pub trait CommandOutput: core::fmt::Debug + Send + 'static {
    /// Achievement unlocked by the command, if any.
    fn achievement_id(&self) -> Option<AchievementId> {
        None
    }
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError>;
}

#[async_trait]
impl<C, H> CommandHandler<C> for Arc<H>
where
    C: Command,
    H: CommandHandler<C> + ?Sized,
{
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError> {
        (**self).handle(ctx, command).await
    }
}
