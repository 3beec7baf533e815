//! Person records (cast and crew).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{DomainError, DomainResult, Entity, Maybe, PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Person payload proposed by an add-person contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub en_name: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub photo: Option<String>,
}

/// Per-field changes proposed by an edit-person contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonChanges {
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub name: Maybe<String>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub en_name: Maybe<Option<String>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub sex: Maybe<Option<Sex>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub birth_date: Maybe<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub death_date: Maybe<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub photo: Maybe<Option<String>>,
}

impl PersonChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
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

impl Person {
    pub fn create(id: PersonId, draft: NewPerson, now: DateTime<Utc>) -> DomainResult<Self> {
        let person = Self {
            id,
            name: draft.name.trim().to_string(),
            en_name: draft.en_name,
            sex: draft.sex,
            birth_date: draft.birth_date,
            death_date: draft.death_date,
            photo: draft.photo,
            created_at: now,
            updated_at: None,
        };
        person.validate()?;
        Ok(person)
    }

    /// Apply the set fields of `changes`. Validation runs on the result, and
    /// the person is left untouched when it fails.
    pub fn apply_changes(&mut self, changes: &PersonChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        let c = changes.clone();
        c.name.map(|n| n.trim().to_string()).assign_to(&mut next.name);
        c.en_name.assign_to(&mut next.en_name);
        c.sex.assign_to(&mut next.sex);
        c.birth_date.assign_to(&mut next.birth_date);
        c.death_date.assign_to(&mut next.death_date);
        c.photo.assign_to(&mut next.photo);
        next.validate()?;

        next.updated_at = Some(now);
        *self = next;
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        if self.name.is_empty() || self.name.chars().count() > 128 {
            return Err(DomainError::validation("person name must be 1..=128 characters"));
        }
        if let (Some(born), Some(died)) = (self.birth_date, self.death_date) {
            if died < born {
                return Err(DomainError::validation("death date precedes birth date"));
            }
        }
        Ok(())
    }
}

impl Entity for Person {
    type Id = PersonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_person(name: &str) -> NewPerson {
        NewPerson {
            name: name.to_string(),
            en_name: None,
            sex: Some(Sex::Female),
            birth_date: NaiveDate::from_ymd_opt(1949, 10, 8),
            death_date: None,
            photo: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::new_person;
    use super::*;

    #[test]
    fn death_before_birth_is_rejected() {
        let mut draft = new_person("Sigourney Weaver");
        draft.death_date = NaiveDate::from_ymd_opt(1900, 1, 1);
        assert!(Person::create(PersonId::new(), draft, Utc::now()).is_err());
    }

    #[test]
    fn failed_change_is_atomic() {
        let mut person = Person::create(PersonId::new(), new_person("Sigourney Weaver"), Utc::now()).unwrap();
        let before = person.clone();
        let changes = PersonChanges {
            en_name: Maybe::Set(Some("Susan Weaver".to_string())),
            death_date: Maybe::Set(NaiveDate::from_ymd_opt(1900, 1, 1)),
            ..PersonChanges::default()
        };
        assert!(person.apply_changes(&changes, Utc::now()).is_err());
        assert_eq!(person, before);
    }

    #[test]
    fn explicit_null_clears_field() {
        let mut person = Person::create(PersonId::new(), new_person("Sigourney Weaver"), Utc::now()).unwrap();
        let changes = PersonChanges {
            sex: Maybe::Set(None),
            ..PersonChanges::default()
        };
        person.apply_changes(&changes, Utc::now()).unwrap();
        assert_eq!(person.sex, None);
        assert!(person.birth_date.is_some());
    }
}
