use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use curator_core::PersonId;
use curator_domain::{Person, Sex};

use crate::committer::DocumentCommitter;
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDocument {
    pub id: PersonId,
    pub name: String,
    pub en_name: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Person> for PersonDocument {
    fn from(p: &Person) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            en_name: p.en_name.clone(),
            sex: p.sex,
            birth_date: p.birth_date,
            death_date: p.death_date,
            photo: p.photo.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<PersonDocument> for Person {
    fn from(d: PersonDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            en_name: d.en_name,
            sex: d.sex,
            birth_date: d.birth_date,
            death_date: d.death_date,
            photo: d.photo,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

persistent!(Person, PersonDocument, Collection::Persons, "person", DocumentCommitter, persons);
