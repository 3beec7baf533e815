use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{Money, MovieId};
use curator_domain::{Genre, Movie, Mpaa};

use crate::committer::DocumentCommitter;
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDocument {
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
    #[serde(default)]
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Movie> for MovieDocument {
    fn from(m: &Movie) -> Self {
        Self {
            id: m.id,
            eng_title: m.eng_title.clone(),
            original_title: m.original_title.clone(),
            release_date: m.release_date,
            countries: m.countries.clone(),
            genres: m.genres.clone(),
            mpaa: m.mpaa,
            duration_minutes: m.duration_minutes,
            budget: m.budget.clone(),
            usa_gross: m.usa_gross.clone(),
            world_gross: m.world_gross.clone(),
            summary: m.summary.clone(),
            photos: m.photos.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<MovieDocument> for Movie {
    fn from(d: MovieDocument) -> Self {
        Self {
            id: d.id,
            eng_title: d.eng_title,
            original_title: d.original_title,
            release_date: d.release_date,
            countries: d.countries,
            genres: d.genres,
            mpaa: d.mpaa,
            duration_minutes: d.duration_minutes,
            budget: d.budget,
            usa_gross: d.usa_gross,
            world_gross: d.world_gross,
            summary: d.summary,
            photos: d.photos,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

persistent!(Movie, MovieDocument, Collection::Movies, "movie", DocumentCommitter, movies);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::persistent::Persistent;

    use super::*;

    #[test]
    fn optionals_render_as_null_and_money_embeds() {
        let movie = Movie {
            id: MovieId::new(),
            eng_title: "Alien".into(),
            original_title: None,
            release_date: NaiveDate::from_ymd_opt(1979, 5, 25).unwrap(),
            countries: vec!["US".into(), "GB".into()],
            genres: vec![Genre::Horror, Genre::ScienceFiction],
            mpaa: Some(Mpaa::R),
            duration_minutes: 117,
            budget: Some(Money::new("11000000", "usd").unwrap()),
            usa_gross: None,
            world_gross: None,
            summary: None,
            photos: vec![],
            created_at: Utc::now(),
            updated_at: None,
        };
        let doc = movie.to_document().unwrap();

        assert_eq!(doc["original_title"], json!(null));
        assert_eq!(doc["release_date"], json!("1979-05-25"));
        assert_eq!(doc["genres"], json!(["horror", "science_fiction"]));
        assert_eq!(doc["mpaa"], json!("r"));
        assert_eq!(doc["budget"]["currency"], json!("USD"));
        assert_eq!(Movie::from_document(doc).unwrap(), movie);
    }
}
