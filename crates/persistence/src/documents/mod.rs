//! Wire documents for every persisted entity.
//!
//! Each entity has a serde struct describing its stored shape. Conversions go
//! both ways; the lock field is never part of a document struct, so reads
//! drop it and writes never carry it.

mod achievements;
mod contributions;
mod credits;
mod movies;
mod persons;
mod users;

pub use achievements::AchievementDocument;
pub use contributions::{
    AddMovieContributionDocument, AddPersonContributionDocument, EditMovieContributionDocument,
    EditPersonContributionDocument,
};
pub use credits::{CrewMemberDocument, RoleDocument, WriterDocument};
pub use movies::MovieDocument;
pub use persons::PersonDocument;
pub use users::UserDocument;
