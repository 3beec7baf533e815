//! Where permission bits come from.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use curator_core::UserId;

use crate::{PermissionCache, Permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionSourceError {
    #[error("permission lookup failed: {0}")]
    Backend(String),
}

/// Resolves the permission bits granted to a user.
///
/// Unknown users resolve to [`Permissions::NONE`]; the authorization stage then
/// rejects them like any other caller lacking the required bits.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Permissions, PermissionSourceError>;
}

#[async_trait]
impl<S> PermissionSource for Arc<S>
where
    S: PermissionSource + ?Sized,
{
    async fn get(&self, user_id: UserId) -> Result<Permissions, PermissionSourceError> {
        (**self).get(user_id).await
    }
}

/// Read-through cache in front of another source.
///
/// The cache is never expired; writers keep it coherent by writing through
/// (see [`PermissionCache::put`] / [`PermissionCache::invalidate`]) after each
/// committed change to a user's permissions.
pub struct CachedPermissionSource<S, C> {
    source: S,
    cache: C,
}

impl<S, C> CachedPermissionSource<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

#[async_trait]
impl<S, C> PermissionSource for CachedPermissionSource<S, C>
where
    S: PermissionSource,
    C: PermissionCache,
{
    async fn get(&self, user_id: UserId) -> Result<Permissions, PermissionSourceError> {
        if let Some(hit) = self.cache.get(user_id) {
            return Ok(hit);
        }

        let permissions = self.source.get(user_id).await?;
        self.cache.put(user_id, permissions);
        Ok(permissions)
    }
}
