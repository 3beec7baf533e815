//! Movie records and the changes contributors can propose for them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{DomainError, DomainResult, Entity, Maybe, Money, MovieId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Biography,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    History,
    Horror,
    Music,
    Mystery,
    Romance,
    ScienceFiction,
    Thriller,
    War,
    Western,
}

/// MPAA film rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mpaa {
    #[serde(rename = "g")]
    G,
    #[serde(rename = "pg")]
    Pg,
    #[serde(rename = "pg-13")]
    Pg13,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "nc-17")]
    Nc17,
}

/// Movie payload proposed by an add-movie contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovie {
    pub eng_title: String,
    pub original_title: Option<String>,
    pub release_date: NaiveDate,
    pub countries: Vec<String>,
    pub genres: Vec<Genre>,
    pub mpaa: Option<Mpaa>,
    pub duration_minutes: u32,
    pub budget: Option<Money>,
    pub usa_gross: Option<Money>,
    pub world_gross: Option<Money>,
    pub summary: Option<String>,
}

impl NewMovie {
    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.eng_title)?;
        validate_countries(&self.countries)?;
        validate_duration(self.duration_minutes)?;
        if self.genres.is_empty() {
            return Err(DomainError::validation("a movie needs at least one genre"));
        }
        Ok(())
    }
}

/// Per-field changes proposed by an edit-movie contribution.
///
/// Only fields the contributor touched are `Set`; nullable fields use
/// `Maybe<Option<_>>` so clearing a value is distinguishable from leaving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieChanges {
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub eng_title: Maybe<String>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub original_title: Maybe<Option<String>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub release_date: Maybe<NaiveDate>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub countries: Maybe<Vec<String>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub genres: Maybe<Vec<Genre>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub mpaa: Maybe<Option<Mpaa>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub duration_minutes: Maybe<u32>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub budget: Maybe<Option<Money>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub usa_gross: Maybe<Option<Money>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub world_gross: Maybe<Option<Money>>,
    #[serde(default, skip_serializing_if = "Maybe::is_unset")]
    pub summary: Maybe<Option<String>>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: MovieId,
    pub eng_title: String,
    pub original_title: Option<String>,
    pub release_date: NaiveDate,
    pub countries: Vec<String>,
    pub genres: Vec<Genre>,
    pub mpaa: Option<Mpaa>,
    pub duration_minutes: u32,
    pub budget: Option<Money>,
    pub usa_gross: Option<Money>,
    pub world_gross: Option<Money>,
    pub summary: Option<String>,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Movie {
    pub fn create(id: MovieId, draft: NewMovie, photos: Vec<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            eng_title: draft.eng_title,
            original_title: draft.original_title,
            release_date: draft.release_date,
            countries: draft.countries,
            genres: draft.genres,
            mpaa: draft.mpaa,
            duration_minutes: draft.duration_minutes,
            budget: draft.budget,
            usa_gross: draft.usa_gross,
            world_gross: draft.world_gross,
            summary: draft.summary,
            photos: dedup_keep_order(photos),
            created_at: now,
            updated_at: None,
        })
    }

    /// Apply the set fields of `changes`; unset fields are left untouched.
    pub fn apply_changes(&mut self, changes: &MovieChanges, now: DateTime<Utc>) -> DomainResult<()> {
        let c = changes.clone();
        if let Maybe::Set(title) = &c.eng_title {
            validate_title(title)?;
        }
        if let Maybe::Set(countries) = &c.countries {
            validate_countries(countries)?;
        }
        if let Maybe::Set(duration) = c.duration_minutes {
            validate_duration(duration)?;
        }

        c.eng_title.assign_to(&mut self.eng_title);
        c.original_title.assign_to(&mut self.original_title);
        c.release_date.assign_to(&mut self.release_date);
        c.countries.assign_to(&mut self.countries);
        c.genres.assign_to(&mut self.genres);
        c.mpaa.assign_to(&mut self.mpaa);
        c.duration_minutes.assign_to(&mut self.duration_minutes);
        c.budget.assign_to(&mut self.budget);
        c.usa_gross.assign_to(&mut self.usa_gross);
        c.world_gross.assign_to(&mut self.world_gross);
        c.summary.assign_to(&mut self.summary);
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn change_photos(&mut self, add: &[String], remove: &[String], now: DateTime<Utc>) {
        self.photos.retain(|p| !remove.contains(p));
        for photo in add {
            if !self.photos.contains(photo) {
                self.photos.push(photo.clone());
            }
        }
        self.updated_at = Some(now);
    }
}

impl Entity for Movie {
    type Id = MovieId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() || title.chars().count() > 200 {
        return Err(DomainError::validation("movie title must be 1..=200 characters"));
    }
    Ok(())
}

fn validate_countries(countries: &[String]) -> DomainResult<()> {
    for code in countries {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "country must be an ISO 3166 alpha-2 code, got '{code}'"
            )));
        }
    }
    Ok(())
}

fn validate_duration(minutes: u32) -> DomainResult<()> {
    if minutes == 0 || minutes > 1_000 {
        return Err(DomainError::validation("duration must be 1..=1000 minutes"));
    }
    Ok(())
}

fn dedup_keep_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            eng_title: title.to_string(),
            original_title: None,
            release_date: NaiveDate::from_ymd_opt(1979, 5, 25).unwrap(),
            countries: vec!["US".to_string(), "GB".to_string()],
            genres: vec![Genre::Horror, Genre::ScienceFiction],
            mpaa: Some(Mpaa::R),
            duration_minutes: 117,
            budget: Some(Money::new("11000000", "USD").unwrap()),
            usa_gross: None,
            world_gross: None,
            summary: Some("In space no one can hear you scream.".to_string()),
        }
    }
}
