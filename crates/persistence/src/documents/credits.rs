use serde::{Deserialize, Serialize};

use curator_core::{CrewMemberId, MovieId, PersonId, RoleId, WriterId};
use curator_domain::{CrewDuty, CrewMember, Role, Writer, Writing};

use crate::committer::{DocumentCommitter, RoleCommitter, WriterCommitter};
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDocument {
    pub id: RoleId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub character: String,
    pub is_main: bool,
}

impl From<&Role> for RoleDocument {
    fn from(r: &Role) -> Self {
        Self {
            id: r.id,
            movie_id: r.movie_id,
            person_id: r.person_id,
            character: r.character.clone(),
            is_main: r.is_main,
        }
    }
}

impl From<RoleDocument> for Role {
    fn from(d: RoleDocument) -> Self {
        Self {
            id: d.id,
            movie_id: d.movie_id,
            person_id: d.person_id,
            character: d.character,
            is_main: d.is_main,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterDocument {
    pub id: WriterId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub writing: Writing,
}

impl From<&Writer> for WriterDocument {
    fn from(w: &Writer) -> Self {
        Self {
            id: w.id,
            movie_id: w.movie_id,
            person_id: w.person_id,
            writing: w.writing,
        }
    }
}

impl From<WriterDocument> for Writer {
    fn from(d: WriterDocument) -> Self {
        Self {
            id: d.id,
            movie_id: d.movie_id,
            person_id: d.person_id,
            writing: d.writing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMemberDocument {
    pub id: CrewMemberId,
    pub movie_id: MovieId,
    pub person_id: PersonId,
    pub duty: CrewDuty,
}

impl From<&CrewMember> for CrewMemberDocument {
    fn from(c: &CrewMember) -> Self {
        Self {
            id: c.id,
            movie_id: c.movie_id,
            person_id: c.person_id,
            duty: c.duty,
        }
    }
}

impl From<CrewMemberDocument> for CrewMember {
    fn from(d: CrewMemberDocument) -> Self {
        Self {
            id: d.id,
            movie_id: d.movie_id,
            person_id: d.person_id,
            duty: d.duty,
        }
    }
}

persistent!(Role, RoleDocument, Collection::Roles, "role", RoleCommitter, roles);
persistent!(Writer, WriterDocument, Collection::Writers, "writer", WriterCommitter, writers);
persistent!(
    CrewMember,
    CrewMemberDocument,
    Collection::CrewMembers,
    "crew member",
    DocumentCommitter,
    crew_members
);
