//! `curator-auth` - permission bits and the checks built on them.
//!
//! This crate is intentionally decoupled from HTTP and storage: the bits of a
//! user come from a [`PermissionSource`] supplied by the application.

pub mod authorize;
pub mod cache;
pub mod permissions;
#[cfg(feature = "redis")]
pub mod redis_cache;
pub mod source;

pub use authorize::{AuthzError, CommandAuthorization, authorize};
pub use cache::{InMemoryPermissionCache, PermissionCache};
pub use permissions::Permissions;
#[cfg(feature = "redis")]
pub use redis_cache::RedisPermissionCache;
pub use source::{CachedPermissionSource, PermissionSource, PermissionSourceError};
