//! Permission-bit caches.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use curator_core::UserId;

use crate::Permissions;

/// Small key/value cache of permission bits.
///
/// Implementations are best-effort: a failing backend behaves like a miss.
pub trait PermissionCache: Send + Sync {
    fn get(&self, user_id: UserId) -> Option<Permissions>;
    fn put(&self, user_id: UserId, permissions: Permissions);
    fn invalidate(&self, user_id: UserId);
}

impl<C> PermissionCache for Arc<C>
where
    C: PermissionCache + ?Sized,
{
    fn get(&self, user_id: UserId) -> Option<Permissions> {
        (**self).get(user_id)
    }

    fn put(&self, user_id: UserId, permissions: Permissions) {
        (**self).put(user_id, permissions)
    }

    fn invalidate(&self, user_id: UserId) {
        (**self).invalidate(user_id)
    }
}

/// Process-local cache for tests/dev and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryPermissionCache {
    inner: RwLock<HashMap<UserId, Permissions>>,
}

impl InMemoryPermissionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionCache for InMemoryPermissionCache {
    fn get(&self, user_id: UserId) -> Option<Permissions> {
        let map = self.inner.read().ok()?;
        map.get(&user_id).copied()
    }

    fn put(&self, user_id: UserId, permissions: Permissions) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(user_id, permissions);
        }
    }

    fn invalidate(&self, user_id: UserId) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&user_id);
        }
    }
}
