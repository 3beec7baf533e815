use async_trait::async_trait;
use chrono::Utc;

use curator_auth::{CommandAuthorization, Permissions};
use curator_core::{ContributionId, MovieId, PersonId};
use curator_domain::{
    AddMovieContribution, AddPersonContribution, CrewDraft, EditMovieContribution, EditPersonContribution,
    MovieChanges, MovieListEdits, NewMovie, NewPerson, PersonChanges, RoleDraft, WriterDraft,
};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::pipeline::{Command, CommandHandler, CommandOutput};

use super::UseCases;

/// Id of a freshly submitted contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub contribution_id: ContributionId,
}

impl CommandOutput for Submitted {}

#[derive(Debug, Clone)]
pub struct SubmitAddMovie {
    pub movie: NewMovie,
    pub roles: Vec<RoleDraft>,
    pub writers: Vec<WriterDraft>,
    pub crew: Vec<CrewDraft>,
    pub photos: Vec<String>,
}

impl CommandAuthorization for SubmitAddMovie {
    fn required_permissions(&self) -> Permissions {
        Permissions::CONTRIBUTE_MOVIES
    }
}

impl Command for SubmitAddMovie {
    const NAME: &'static str = "submit_add_movie";
    type Output = Submitted;
}

#[async_trait]
impl CommandHandler<SubmitAddMovie> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: SubmitAddMovie) -> Result<Submitted, AppError> {
        let contribution = AddMovieContribution::submit(
            ctx.caller(),
            command.movie,
            command.roles,
            command.writers,
            command.crew,
            command.photos,
            Utc::now(),
        )?;
        let contribution_id = contribution.id;
        ctx.session()?.add_movie_contributions().save(contribution)?;
        Ok(Submitted { contribution_id })
    }
}

#[derive(Debug, Clone)]
pub struct SubmitEditMovie {
    pub movie_id: MovieId,
    pub changes: MovieChanges,
    pub lists: MovieListEdits,
}

impl CommandAuthorization for SubmitEditMovie {
    fn required_permissions(&self) -> Permissions {
        Permissions::CONTRIBUTE_MOVIES
    }
}

impl Command for SubmitEditMovie {
    const NAME: &'static str = "submit_edit_movie";
    type Output = Submitted;
}

#[async_trait]
impl CommandHandler<SubmitEditMovie> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: SubmitEditMovie) -> Result<Submitted, AppError> {
        let author = ctx.caller();
        let session = ctx.session()?;
        if session.movies().by_id(command.movie_id).await?.is_none() {
            return Err(AppError::not_found("movie", command.movie_id));
        }

        let contribution =
            EditMovieContribution::submit(author, command.movie_id, command.changes, command.lists, Utc::now())?;
        let contribution_id = contribution.id;
        session.edit_movie_contributions().save(contribution)?;
        Ok(Submitted { contribution_id })
    }
}

#[derive(Debug, Clone)]
pub struct SubmitAddPerson {
    pub person: NewPerson,
}

impl CommandAuthorization for SubmitAddPerson {
    fn required_permissions(&self) -> Permissions {
        Permissions::CONTRIBUTE_PERSONS
    }
}

impl Command for SubmitAddPerson {
    const NAME: &'static str = "submit_add_person";
    type Output = Submitted;
}

#[async_trait]
impl CommandHandler<SubmitAddPerson> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: SubmitAddPerson) -> Result<Submitted, AppError> {
        let contribution = AddPersonContribution::submit(ctx.caller(), command.person, Utc::now())?;
        let contribution_id = contribution.id;
        ctx.session()?.add_person_contributions().save(contribution)?;
        Ok(Submitted { contribution_id })
    }
}

#[derive(Debug, Clone)]
pub struct SubmitEditPerson {
    pub person_id: PersonId,
    pub changes: PersonChanges,
}

impl CommandAuthorization for SubmitEditPerson {
    fn required_permissions(&self) -> Permissions {
        Permissions::CONTRIBUTE_PERSONS
    }
}

impl Command for SubmitEditPerson {
    const NAME: &'static str = "submit_edit_person";
    type Output = Submitted;
}

#[async_trait]
impl CommandHandler<SubmitEditPerson> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: SubmitEditPerson) -> Result<Submitted, AppError> {
        let author = ctx.caller();
        let session = ctx.session()?;
        if session.persons().by_id(command.person_id).await?.is_none() {
            return Err(AppError::not_found("person", command.person_id));
        }

        let contribution = EditPersonContribution::submit(author, command.person_id, command.changes, Utc::now())?;
        let contribution_id = contribution.id;
        session.edit_person_contributions().save(contribution)?;
        Ok(Submitted { contribution_id })
    }
}
