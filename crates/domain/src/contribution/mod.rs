//! Contributions: proposed, not-yet-applied changes awaiting moderation.
//!
//! All four variants share the same lifecycle (`pending` → `accepted` |
//! `rejected`) and bookkeeping fields; the payload differs per variant.

mod add_movie;
mod add_person;
mod edit_movie;
mod edit_person;

pub use add_movie::AddMovieContribution;
pub use add_person::AddPersonContribution;
pub use edit_movie::{EditMovieContribution, MovieListEdits};
pub use edit_person::EditPersonContribution;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{ContributionId, DomainError, DomainResult, Entity, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    AddMovie,
    EditMovie,
    AddPerson,
    EditPerson,
}

impl ContributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddMovie => "add_movie",
            Self::EditMovie => "edit_movie",
            Self::AddPerson => "add_person",
            Self::EditPerson => "edit_person",
        }
    }
}

impl core::fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared moderation lifecycle.
pub trait Contribution: Entity<Id = ContributionId> {
    const KIND: ContributionKind;

    fn author_id(&self) -> UserId;
    fn status(&self) -> ContributionStatus;
    fn status_updated_at(&self) -> Option<DateTime<Utc>>;

    #[doc(hidden)]
    fn set_status(&mut self, status: ContributionStatus, at: DateTime<Utc>);

    fn is_pending(&self) -> bool {
        self.status() == ContributionStatus::Pending
    }

    fn accept(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ContributionStatus::Accepted, now)
    }

    fn reject(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ContributionStatus::Rejected, now)
    }

    fn transition(&mut self, to: ContributionStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::invariant(format!(
                "contribution {} is already {}",
                self.id(),
                self.status().as_str()
            )));
        }
        self.set_status(to, now);
        Ok(())
    }
}

/// Implements `Entity` + `Contribution` for a variant with the shared fields
/// `id`, `author_id`, `status`, `status_updated_at`.
macro_rules! impl_contribution {
    ($t:ty, $kind:expr) => {
        impl curator_core::Entity for $t {
            type Id = curator_core::ContributionId;

            fn id(&self) -> &Self::Id {
                &self.id
            }
        }

        impl $crate::contribution::Contribution for $t {
            const KIND: $crate::contribution::ContributionKind = $kind;

            fn author_id(&self) -> curator_core::UserId {
                self.author_id
            }

            fn status(&self) -> $crate::contribution::ContributionStatus {
                self.status
            }

            fn status_updated_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.status_updated_at
            }

            fn set_status(
                &mut self,
                status: $crate::contribution::ContributionStatus,
                at: chrono::DateTime<chrono::Utc>,
            ) {
                self.status = status;
                self.status_updated_at = Some(at);
            }
        }
    };
}
pub(crate) use impl_contribution;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::fixtures::new_person;

    #[test]
    fn accept_then_reject_is_refused() {
        let mut c = AddPersonContribution::submit(UserId::new(), new_person("Ian Holm"), Utc::now()).unwrap();
        assert!(c.is_pending());
        c.accept(Utc::now()).unwrap();
        assert_eq!(c.status(), ContributionStatus::Accepted);
        assert!(c.status_updated_at().is_some());

        let err = c.reject(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(c.status(), ContributionStatus::Accepted);
    }

    #[test]
    fn status_wire_values() {
        assert_eq!(serde_json::to_value(ContributionStatus::Pending).unwrap(), serde_json::json!("pending"));
        assert_eq!(serde_json::to_value(ContributionKind::EditMovie).unwrap(), serde_json::json!("edit_movie"));
    }
}
