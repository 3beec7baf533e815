//! Errors raised by entity constructors and domain rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A rule of the moderation domain refused an operation.
///
/// Only pure, input-determined failures live here. Storage, locking and
/// authorization failures have their own error types in the crates that
/// own those concerns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Submitted data is malformed (empty title, death before birth, ...).
    #[error("invalid input: {0}")]
    Validation(String),

    /// An entity is not in a state that allows the operation, such as
    /// moderating a contribution twice.
    #[error("illegal state: {0}")]
    InvariantViolation(String),

    /// Text that should hold an identifier does not parse as one.
    #[error("malformed id: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation(reason.into())
    }

    pub fn invalid_id(raw: impl Into<String>) -> Self {
        Self::InvalidId(raw.into())
    }
}
