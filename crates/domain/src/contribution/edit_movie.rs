use chrono::{DateTime, Utc};

use curator_core::{ContributionId, CrewMemberId, DomainError, DomainResult, MovieId, PersonId, RoleId, UserId, WriterId};

use super::{ContributionKind, ContributionStatus, impl_contribution};
use crate::credits::{CrewDraft, RoleDraft, WriterDraft, referenced_persons};
use crate::movie::MovieChanges;

/// Proposal to change an existing movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMovieContribution {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub movie_id: MovieId,
    pub changes: MovieChanges,
    pub roles_to_add: Vec<RoleDraft>,
    pub roles_to_remove: Vec<RoleId>,
    pub writers_to_add: Vec<WriterDraft>,
    pub writers_to_remove: Vec<WriterId>,
    pub crew_to_add: Vec<CrewDraft>,
    pub crew_to_remove: Vec<CrewMemberId>,
    pub photos_to_add: Vec<String>,
    pub photos_to_remove: Vec<String>,
}

/// Credit and photo list edits carried next to the field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieListEdits {
    pub roles_to_add: Vec<RoleDraft>,
    pub roles_to_remove: Vec<RoleId>,
    pub writers_to_add: Vec<WriterDraft>,
    pub writers_to_remove: Vec<WriterId>,
    pub crew_to_add: Vec<CrewDraft>,
    pub crew_to_remove: Vec<CrewMemberId>,
    pub photos_to_add: Vec<String>,
    pub photos_to_remove: Vec<String>,
}

impl MovieListEdits {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl EditMovieContribution {
    pub fn submit(
        author_id: UserId,
        movie_id: MovieId,
        changes: MovieChanges,
        lists: MovieListEdits,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if changes.is_empty() && lists.is_empty() {
            return Err(DomainError::validation("edit contribution changes nothing"));
        }
        for role in &lists.roles_to_add {
            role.validate()?;
        }

        Ok(Self {
            id: ContributionId::new(),
            author_id,
            status: ContributionStatus::Pending,
            created_at: now,
            status_updated_at: None,
            movie_id,
            changes,
            roles_to_add: lists.roles_to_add,
            roles_to_remove: lists.roles_to_remove,
            writers_to_add: lists.writers_to_add,
            writers_to_remove: lists.writers_to_remove,
            crew_to_add: lists.crew_to_add,
            crew_to_remove: lists.crew_to_remove,
            photos_to_add: lists.photos_to_add,
            photos_to_remove: lists.photos_to_remove,
        })
    }

    /// Persons referenced by credits being added.
    pub fn referenced_persons(&self) -> Vec<PersonId> {
        referenced_persons(&self.roles_to_add, &self.writers_to_add, &self.crew_to_add)
    }
}

impl_contribution!(EditMovieContribution, ContributionKind::EditMovie);
