use chrono::{DateTime, Utc};

use curator_core::{ContributionId, DomainResult, PersonId, UserId};

use super::{ContributionKind, ContributionStatus, impl_contribution};
use crate::person::{NewPerson, Person};

/// Proposal to add a new person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPersonContribution {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub person: NewPerson,
    /// Person created when the contribution was accepted.
    pub person_id: Option<PersonId>,
}

impl AddPersonContribution {
    pub fn submit(author_id: UserId, person: NewPerson, now: DateTime<Utc>) -> DomainResult<Self> {
        // Validate by building a throwaway person.
        Person::create(PersonId::new(), person.clone(), now)?;

        Ok(Self {
            id: ContributionId::new(),
            author_id,
            status: ContributionStatus::Pending,
            created_at: now,
            status_updated_at: None,
            person,
            person_id: None,
        })
    }
}

impl_contribution!(AddPersonContribution, ContributionKind::AddPerson);
