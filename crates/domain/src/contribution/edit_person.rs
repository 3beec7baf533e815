use chrono::{DateTime, Utc};

use curator_core::{ContributionId, DomainError, DomainResult, PersonId, UserId};

use super::{ContributionKind, ContributionStatus, impl_contribution};
use crate::person::PersonChanges;

/// Proposal to change an existing person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPersonContribution {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub person_id: PersonId,
    pub changes: PersonChanges,
}

impl EditPersonContribution {
    pub fn submit(
        author_id: UserId,
        person_id: PersonId,
        changes: PersonChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if changes.is_empty() {
            return Err(DomainError::validation("edit contribution changes nothing"));
        }
        Ok(Self {
            id: ContributionId::new(),
            author_id,
            status: ContributionStatus::Pending,
            created_at: now,
            status_updated_at: None,
            person_id,
            changes,
        })
    }
}

impl_contribution!(EditPersonContribution, ContributionKind::EditPerson);
