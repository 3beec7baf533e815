use std::sync::Arc;

use async_trait::async_trait;

use curator_auth::{PermissionSource, authorize};

use crate::context::RequestContext;
use crate::error::AppError;

use super::{Command, CommandHandler};

/// Rejects callers whose permission bits do not cover the command's.
pub struct Authorization<H> {
    inner: H,
    permissions: Arc<dyn PermissionSource>,
}

impl<H> Authorization<H> {
    pub fn new(inner: H, permissions: Arc<dyn PermissionSource>) -> Self {
        Self { inner, permissions }
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for Authorization<H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, ctx: &mut RequestContext, command: C) -> Result<C::Output, AppError> {
        let required = command.required_permissions();
        let granted = self.permissions.get(ctx.caller()).await?;
        authorize(granted, required)?;
        tracing::debug!(%required, %granted, "authorized");

        self.inner.handle(ctx, command).await
    }
}
