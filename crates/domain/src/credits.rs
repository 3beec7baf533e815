//! Credits linking persons to movies: acting roles, writing and crew.

use serde::{Deserialize, Serialize};

use curator_core::{CrewMemberId, DomainError, DomainResult, Entity, MovieId, PersonId, RoleId, WriterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Writing {
    Screenplay,
    Story,
    Novel,
    Characters,
    Dialogue,
    Adaptation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewDuty {
    Director,
    Producer,
    ExecutiveProducer,
    Composer,
    Cinematographer,
    Editor,
    ProductionDesigner,
    CostumeDesigner,
}

/// Acting role. Unique per (character, person).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub character: String,
    pub is_main: bool,
}

/// Writing credit. Unique per (person, movie, writing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Writer {
    pub id: WriterId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub writing: Writing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewMember {
    pub id: CrewMemberId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub duty: CrewDuty,
}

/// Role sub-record embedded in movie contributions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleDraft {
    pub person_id: PersonId,
    pub character: String,
    pub is_main: bool,
}

/// Writer sub-record embedded in movie contributions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriterDraft {
    pub person_id: PersonId,
    pub writing: Writing,
}

/// Crew sub-record embedded in movie contributions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrewDraft {
    pub person_id: PersonId,
    pub duty: CrewDuty,
}

impl RoleDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.character.trim().is_empty() || self.character.chars().count() > 128 {
            return Err(DomainError::validation("character must be 1..=128 characters"));
        }
        Ok(())
    }

    pub fn into_role(self, movie_id: MovieId) -> Role {
        Role {
            id: RoleId::new(),
            movie_id,
            person_id: self.person_id,
            character: self.character.trim().to_string(),
            is_main: self.is_main,
        }
    }
}

impl WriterDraft {
    pub fn into_writer(self, movie_id: MovieId) -> Writer {
        Writer {
            id: WriterId::new(),
            movie_id,
            person_id: self.person_id,
            writing: self.writing,
        }
    }
}

impl CrewDraft {
    pub fn into_crew_member(self, movie_id: MovieId) -> CrewMember {
        CrewMember {
            id: CrewMemberId::new(),
            movie_id,
            person_id: self.person_id,
            duty: self.duty,
        }
    }
}

/// Persons referenced by a set of credit drafts, sorted and deduplicated.
pub fn referenced_persons(roles: &[RoleDraft], writers: &[WriterDraft], crew: &[CrewDraft]) -> Vec<PersonId> {
    let mut ids: Vec<PersonId> = roles
        .iter()
        .map(|r| r.person_id)
        .chain(writers.iter().map(|w| w.person_id))
        .chain(crew.iter().map(|c| c.person_id))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for Writer {
    type Id = WriterId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for CrewMember {
    type Id = CrewMemberId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
