use chrono::{DateTime, Utc};

use curator_core::{ContributionId, DomainError, DomainResult, MovieId, PersonId, UserId};

use super::{ContributionKind, ContributionStatus, impl_contribution};
use crate::credits::{CrewDraft, RoleDraft, WriterDraft, referenced_persons};
use crate::movie::NewMovie;

/// Proposal to add a new movie together with its credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMovieContribution {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub movie: NewMovie,
    pub roles: Vec<RoleDraft>,
    pub writers: Vec<WriterDraft>,
    pub crew: Vec<CrewDraft>,
    pub photos: Vec<String>,
    /// Movie created when the contribution was accepted.
    pub movie_id: Option<MovieId>,
}

impl AddMovieContribution {
    pub fn submit(
        author_id: UserId,
        movie: NewMovie,
        roles: Vec<RoleDraft>,
        writers: Vec<WriterDraft>,
        crew: Vec<CrewDraft>,
        photos: Vec<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        movie.validate()?;
        for role in &roles {
            role.validate()?;
        }
        if has_duplicates(&roles) || has_duplicates(&writers) || has_duplicates(&crew) {
            return Err(DomainError::validation("duplicate credit in contribution"));
        }

        Ok(Self {
            id: ContributionId::new(),
            author_id,
            status: ContributionStatus::Pending,
            created_at: now,
            status_updated_at: None,
            movie,
            roles,
            writers,
            crew,
            photos,
            movie_id: None,
        })
    }

    /// Every person the credits point at; all must exist for acceptance.
    pub fn referenced_persons(&self) -> Vec<PersonId> {
        referenced_persons(&self.roles, &self.writers, &self.crew)
    }
}

impl_contribution!(AddMovieContribution, ContributionKind::AddMovie);

fn has_duplicates<T: Eq + core::hash::Hash>(items: &[T]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.iter().any(|item| !seen.insert(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credits::Writing;
    use crate::movie::fixtures::new_movie;

    #[test]
    fn duplicate_credits_are_rejected() {
        let person = PersonId::new();
        let writer = WriterDraft { person_id: person, writing: Writing::Screenplay };
        let result = AddMovieContribution::submit(
            UserId::new(),
            new_movie("Alien"),
            vec![],
            vec![writer.clone(), writer],
            vec![],
            vec![],
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn submit_starts_pending_without_movie() {
        let c = AddMovieContribution::submit(UserId::new(), new_movie("Alien"), vec![], vec![], vec![], vec![], Utc::now())
            .unwrap();
        assert_eq!(c.status, ContributionStatus::Pending);
        assert!(c.movie_id.is_none());
    }
}
