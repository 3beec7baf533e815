//! `curator-domain` - movie database records and moderation rules.
//!
//! Entities here are plain mutable records. They carry validation and the
//! pure state transitions used by use cases; persistence lives elsewhere.

pub mod achievement;
pub mod contribution;
pub mod credits;
pub mod movie;
pub mod person;
pub mod rating;
pub mod user;

pub use achievement::{Achievement, Milestone};
pub use contribution::{
    AddMovieContribution, AddPersonContribution, Contribution, ContributionKind, ContributionStatus,
    EditMovieContribution, EditPersonContribution, MovieListEdits,
};
pub use credits::{CrewDraft, CrewDuty, CrewMember, Role, RoleDraft, Writer, WriterDraft, Writing};
pub use movie::{Genre, Movie, MovieChanges, Mpaa, NewMovie};
pub use person::{NewPerson, Person, PersonChanges, Sex};
pub use user::User;
