use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{ContributionId, CrewMemberId, MovieId, PersonId, RoleId, UserId, WriterId};
use curator_domain::{
    AddMovieContribution, AddPersonContribution, ContributionStatus, CrewDraft, EditMovieContribution,
    EditPersonContribution, MovieChanges, NewMovie, NewPerson, PersonChanges, RoleDraft, WriterDraft,
};

use crate::committer::DocumentCommitter;
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMovieContributionDocument {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub movie: NewMovie,
    #[serde(default)]
    pub roles: Vec<RoleDraft>,
    #[serde(default)]
    pub writers: Vec<WriterDraft>,
    #[serde(default)]
    pub crew: Vec<CrewDraft>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub movie_id: Option<MovieId>,
}

impl From<&AddMovieContribution> for AddMovieContributionDocument {
    fn from(c: &AddMovieContribution) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            status: c.status,
            created_at: c.created_at,
            status_updated_at: c.status_updated_at,
            movie: c.movie.clone(),
            roles: c.roles.clone(),
            writers: c.writers.clone(),
            crew: c.crew.clone(),
            photos: c.photos.clone(),
            movie_id: c.movie_id,
        }
    }
}

impl From<AddMovieContributionDocument> for AddMovieContribution {
    fn from(d: AddMovieContributionDocument) -> Self {
        Self {
            id: d.id,
            author_id: d.author_id,
            status: d.status,
            created_at: d.created_at,
            status_updated_at: d.status_updated_at,
            movie: d.movie,
            roles: d.roles,
            writers: d.writers,
            crew: d.crew,
            photos: d.photos,
            movie_id: d.movie_id,
        }
    }
}

/// Scalar edits sit at the top level of the document, so each one is a
/// separate field for update diffs. An absent field means "no change".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMovieContributionDocument {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub movie_id: MovieId,
    #[serde(flatten)]
    pub changes: MovieChanges,
    #[serde(default)]
    pub roles_to_add: Vec<RoleDraft>,
    #[serde(default)]
    pub roles_to_remove: Vec<RoleId>,
    #[serde(default)]
    pub writers_to_add: Vec<WriterDraft>,
    #[serde(default)]
    pub writers_to_remove: Vec<WriterId>,
    #[serde(default)]
    pub crew_to_add: Vec<CrewDraft>,
    #[serde(default)]
    pub crew_to_remove: Vec<CrewMemberId>,
    #[serde(default)]
    pub photos_to_add: Vec<String>,
    #[serde(default)]
    pub photos_to_remove: Vec<String>,
}

impl From<&EditMovieContribution> for EditMovieContributionDocument {
    fn from(c: &EditMovieContribution) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            status: c.status,
            created_at: c.created_at,
            status_updated_at: c.status_updated_at,
            movie_id: c.movie_id,
            changes: c.changes.clone(),
            roles_to_add: c.roles_to_add.clone(),
            roles_to_remove: c.roles_to_remove.clone(),
            writers_to_add: c.writers_to_add.clone(),
            writers_to_remove: c.writers_to_remove.clone(),
            crew_to_add: c.crew_to_add.clone(),
            crew_to_remove: c.crew_to_remove.clone(),
            photos_to_add: c.photos_to_add.clone(),
            photos_to_remove: c.photos_to_remove.clone(),
        }
    }
}

impl From<EditMovieContributionDocument> for EditMovieContribution {
    fn from(d: EditMovieContributionDocument) -> Self {
        Self {
            id: d.id,
            author_id: d.author_id,
            status: d.status,
            created_at: d.created_at,
            status_updated_at: d.status_updated_at,
            movie_id: d.movie_id,
            changes: d.changes,
            roles_to_add: d.roles_to_add,
            roles_to_remove: d.roles_to_remove,
            writers_to_add: d.writers_to_add,
            writers_to_remove: d.writers_to_remove,
            crew_to_add: d.crew_to_add,
            crew_to_remove: d.crew_to_remove,
            photos_to_add: d.photos_to_add,
            photos_to_remove: d.photos_to_remove,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPersonContributionDocument {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub person: NewPerson,
    pub person_id: Option<PersonId>,
}

impl From<&AddPersonContribution> for AddPersonContributionDocument {
    fn from(c: &AddPersonContribution) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            status: c.status,
            created_at: c.created_at,
            status_updated_at: c.status_updated_at,
            person: c.person.clone(),
            person_id: c.person_id,
        }
    }
}

impl From<AddPersonContributionDocument> for AddPersonContribution {
    fn from(d: AddPersonContributionDocument) -> Self {
        Self {
            id: d.id,
            author_id: d.author_id,
            status: d.status,
            created_at: d.created_at,
            status_updated_at: d.status_updated_at,
            person: d.person,
            person_id: d.person_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPersonContributionDocument {
    pub id: ContributionId,
    pub author_id: UserId,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub person_id: PersonId,
    #[serde(flatten)]
    pub changes: PersonChanges,
}

impl From<&EditPersonContribution> for EditPersonContributionDocument {
    fn from(c: &EditPersonContribution) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            status: c.status,
            created_at: c.created_at,
            status_updated_at: c.status_updated_at,
            person_id: c.person_id,
            changes: c.changes.clone(),
        }
    }
}

impl From<EditPersonContributionDocument> for EditPersonContribution {
    fn from(d: EditPersonContributionDocument) -> Self {
        Self {
            id: d.id,
            author_id: d.author_id,
            status: d.status,
            created_at: d.created_at,
            status_updated_at: d.status_updated_at,
            person_id: d.person_id,
            changes: d.changes,
        }
    }
}

persistent!(
    AddMovieContribution,
    AddMovieContributionDocument,
    Collection::AddMovieContributions,
    "add-movie contribution",
    DocumentCommitter,
    add_movie_contributions
);
persistent!(
    EditMovieContribution,
    EditMovieContributionDocument,
    Collection::EditMovieContributions,
    "edit-movie contribution",
    DocumentCommitter,
    edit_movie_contributions
);
persistent!(
    AddPersonContribution,
    AddPersonContributionDocument,
    Collection::AddPersonContributions,
    "add-person contribution",
    DocumentCommitter,
    add_person_contributions
);
persistent!(
    EditPersonContribution,
    EditPersonContributionDocument,
    Collection::EditPersonContributions,
    "edit-person contribution",
    DocumentCommitter,
    edit_person_contributions
);
