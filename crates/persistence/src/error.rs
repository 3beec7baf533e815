use thiserror::Error;

use crate::store::StoreError;

/// Which unique user attribute collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Id,
    Name,
    Email,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
        }
    }
}

impl core::fmt::Display for UserField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence-layer failure.
///
/// `ConsistencyViolation` signals a bug in the calling code (an invariant of
/// the identity map or unit of work was broken) and is never recoverable.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("user {0} is already taken")]
    AlreadyTaken(UserField),

    #[error("{kind} already exists")]
    AlreadyExists { kind: &'static str },

    #[error("failed to map {kind} document: {message}")]
    Mapping { kind: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistenceError {
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::ConsistencyViolation(msg.into())
    }

    pub fn mapping(kind: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Mapping {
            kind,
            message: err.to_string(),
        }
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
