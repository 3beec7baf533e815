//! Redis-backed permission cache (optional).
//!
//! Entries are plain integers under `<prefix>:<user id>`. Redis failures are
//! logged and degrade to cache misses; the store stays the source of truth.

use redis::Commands;

use curator_core::UserId;

use crate::{PermissionCache, Permissions};

#[derive(Debug, Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    prefix: String,
}

impl RedisPermissionCache {
    pub fn new(redis_url: impl AsRef<str>, prefix: impl Into<String>) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url.as_ref())?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:{}", self.prefix, user_id)
    }
}

impl PermissionCache for RedisPermissionCache {
    fn get(&self, user_id: UserId) -> Option<Permissions> {
        let mut conn = match self.client.get_connection() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "permission cache unavailable");
                return None;
            }
        };

        match conn.get::<_, Option<u64>>(self.key(user_id)) {
            Ok(bits) => bits.map(Permissions::from_bits),
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "permission cache read failed");
                None
            }
        }
    }

    fn put(&self, user_id: UserId, permissions: Permissions) {
        let result = self
            .client
            .get_connection()
            .and_then(|mut conn| conn.set::<_, _, ()>(self.key(user_id), permissions.bits()));
        if let Err(e) = result {
            tracing::warn!(error = %e, %user_id, "permission cache write failed");
        }
    }

    fn invalidate(&self, user_id: UserId) {
        let result = self
            .client
            .get_connection()
            .and_then(|mut conn| conn.del::<_, ()>(self.key(user_id)));
        if let Err(e) = result {
            tracing::warn!(error = %e, %user_id, "permission cache invalidation failed");
        }
    }
}
