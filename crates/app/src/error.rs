//! Application error model.
//!
//! Lower layers keep their own error enums; this is where they meet. Every
//! variant except `ConsistencyViolation` describes a failure the caller can
//! act on. A consistency violation means a bug and is never retried.

use thiserror::Error;

use curator_auth::{AuthzError, PermissionSourceError};
use curator_core::{ContributionId, DomainError};
use curator_events::PublishError;
use curator_persistence::{PersistenceError, StoreError, UserField};

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists")]
    AlreadyExists { kind: &'static str },

    #[error("user {0} is already taken")]
    AlreadyTaken(UserField),

    #[error("{kind} references missing ids: {}", missing.join(", "))]
    ReferentialGap { kind: &'static str, missing: Vec<String> },

    #[error(transparent)]
    PermissionDenied(#[from] AuthzError),

    #[error("contribution {0} is not pending")]
    NotPending(ContributionId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    PermissionSource(#[from] PermissionSourceError),

    /// Publication failed after the transaction committed; the writes stand.
    #[error("event publication failed: {0}")]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable short name for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::AlreadyTaken(_) => "already_taken",
            Self::ReferentialGap { .. } => "referential_gap",
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotPending(_) => "not_pending",
            Self::Validation(_) => "validation_error",
            Self::ConsistencyViolation(_) => "consistency_violation",
            Self::Store(_) => "store_error",
            Self::PermissionSource(_) => "permission_source_error",
            Self::Publish(_) => "publish_error",
            Self::Config(_) => "config_error",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AppError::Validation(msg),
            DomainError::InvariantViolation(msg) => AppError::Validation(msg),
        }
    }
}

impl From<PersistenceError> for AppError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::ConsistencyViolation(msg) => AppError::ConsistencyViolation(msg),
            PersistenceError::AlreadyTaken(field) => AppError::AlreadyTaken(field),
            PersistenceError::AlreadyExists { kind } => AppError::AlreadyExists { kind },
            PersistenceError::Mapping { kind, message } => {
                AppError::ConsistencyViolation(format!("stored {kind} is unreadable: {message}"))
            }
            PersistenceError::Store(err) => AppError::Store(err),
        }
    }
}
