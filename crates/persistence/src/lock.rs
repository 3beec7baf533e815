//! Lock tokens written by pessimistic acquisition.
//!
//! Exclusivity comes from the store's atomic find-and-modify; the token is
//! only the value written into the lock field. A constant marker is enough,
//! unique tokens help when tracing who stamped a document.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for LockToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait LockFactory: Send + Sync {
    fn token(&self) -> LockToken;
}

impl<L> LockFactory for Arc<L>
where
    L: LockFactory + ?Sized,
{
    fn token(&self) -> LockToken {
        (**self).token()
    }
}

/// Hands out the same marker every time.
#[derive(Debug, Clone)]
pub struct ConstantLockFactory {
    token: LockToken,
}

impl ConstantLockFactory {
    pub const DEFAULT_TOKEN: &'static str = "locked";

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: LockToken::new(token),
        }
    }
}

impl Default for ConstantLockFactory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOKEN)
    }
}

impl LockFactory for ConstantLockFactory {
    fn token(&self) -> LockToken {
        self.token.clone()
    }
}

/// A fresh UUIDv7 per acquisition.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidLockFactory;

impl LockFactory for UuidLockFactory {
    fn token(&self) -> LockToken {
        LockToken(uuid::Uuid::now_v7().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_factory_repeats_its_marker() {
        let f = ConstantLockFactory::default();
        assert_eq!(f.token(), f.token());
        assert_eq!(f.token().as_str(), "locked");
    }

    #[test]
    fn uuid_factory_never_repeats() {
        let f = UuidLockFactory;
        assert_ne!(f.token(), f.token());
    }
}
