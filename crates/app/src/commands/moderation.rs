use async_trait::async_trait;
use chrono::{DateTime, Utc};

use curator_auth::{CommandAuthorization, Permissions};
use curator_core::{AchievementId, ContributionId, MovieId, PersonId};
use curator_domain::{
    AddMovieContribution, AddPersonContribution, Contribution, ContributionKind, ContributionStatus, CrewDraft,
    EditMovieContribution, EditPersonContribution, Milestone, Movie, Person, RoleDraft, User, WriterDraft,
};
use curator_persistence::{Persistent, Session};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::pipeline::{Command, CommandHandler, CommandOutput};

use super::{UseCases, milestones};

/// Outcome of a moderation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moderated {
    pub contribution_id: ContributionId,
    pub status: ContributionStatus,
    pub achievement_id: Option<AchievementId>,
}

impl CommandOutput for Moderated {
    fn achievement_id(&self) -> Option<AchievementId> {
        self.achievement_id
    }
}

fn moderation_permissions(kind: ContributionKind) -> Permissions {
    match kind {
        ContributionKind::AddMovie | ContributionKind::EditMovie => Permissions::MODERATE_MOVIES,
        ContributionKind::AddPerson | ContributionKind::EditPerson => Permissions::MODERATE_PERSONS,
    }
}

/// Accept a pending contribution and apply its payload.
#[derive(Debug, Clone, Copy)]
pub struct AcceptContribution {
    pub kind: ContributionKind,
    pub contribution_id: ContributionId,
}

impl CommandAuthorization for AcceptContribution {
    fn required_permissions(&self) -> Permissions {
        moderation_permissions(self.kind)
    }
}

impl Command for AcceptContribution {
    const NAME: &'static str = "accept_contribution";
    type Output = Moderated;
}

#[async_trait]
impl CommandHandler<AcceptContribution> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: AcceptContribution) -> Result<Moderated, AppError> {
        let session = ctx.session()?;
        let id = command.contribution_id;
        let now = Utc::now();

        match command.kind {
            ContributionKind::AddMovie => {
                let (c, author) = pending::<AddMovieContribution>(session, id).await?;
                accept_add_movie(session, c, author, now).await
            }
            ContributionKind::EditMovie => {
                let (c, author) = pending::<EditMovieContribution>(session, id).await?;
                accept_edit_movie(session, c, author, now).await
            }
            ContributionKind::AddPerson => {
                let (c, author) = pending::<AddPersonContribution>(session, id).await?;
                accept_add_person(session, c, author, now).await
            }
            ContributionKind::EditPerson => {
                let (c, author) = pending::<EditPersonContribution>(session, id).await?;
                accept_edit_person(session, c, author, now).await
            }
        }
    }
}

/// Reject a pending contribution; its payload is never applied.
#[derive(Debug, Clone, Copy)]
pub struct RejectContribution {
    pub kind: ContributionKind,
    pub contribution_id: ContributionId,
}

impl CommandAuthorization for RejectContribution {
    fn required_permissions(&self) -> Permissions {
        moderation_permissions(self.kind)
    }
}

impl Command for RejectContribution {
    const NAME: &'static str = "reject_contribution";
    type Output = Moderated;
}

#[async_trait]
impl CommandHandler<RejectContribution> for UseCases {
    async fn handle(&self, ctx: &mut RequestContext, command: RejectContribution) -> Result<Moderated, AppError> {
        let session = ctx.session()?;
        let id = command.contribution_id;
        let now = Utc::now();

        match command.kind {
            ContributionKind::AddMovie => reject::<AddMovieContribution>(session, id, now).await,
            ContributionKind::EditMovie => reject::<EditMovieContribution>(session, id, now).await,
            ContributionKind::AddPerson => reject::<AddPersonContribution>(session, id, now).await,
            ContributionKind::EditPerson => reject::<EditPersonContribution>(session, id, now).await,
        }
    }
}

/// Acquire a pending contribution together with its author.
async fn pending<E>(session: &mut Session, id: ContributionId) -> Result<(E, User), AppError>
where
    E: Persistent + Contribution,
{
    let contribution = session
        .mapper::<E>()
        .acquire_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(<E as Persistent>::KIND, id))?;
    if !contribution.is_pending() {
        return Err(AppError::NotPending(id));
    }

    let author_id = contribution.author_id();
    let author = session
        .users()
        .acquire_by_id(author_id)
        .await?
        .ok_or_else(|| AppError::not_found("user", author_id))?;
    Ok((contribution, author))
}

async fn reject<E>(session: &mut Session, id: ContributionId, now: DateTime<Utc>) -> Result<Moderated, AppError>
where
    E: Persistent + Contribution,
{
    let (mut contribution, mut author) = pending::<E>(session, id).await?;
    contribution.reject(now)?;
    session.mapper::<E>().update(contribution)?;

    let count = author.record_rejected(<E as Contribution>::KIND);
    let author_id = author.id;
    session.users().update(author)?;

    let achievement_id = milestones::unlock(session, author_id, Milestone::for_rejected_count(count), now).await?;
    Ok(Moderated {
        contribution_id: id,
        status: ContributionStatus::Rejected,
        achievement_id,
    })
}

/// Mark `contribution` accepted and credit its author.
async fn finish_acceptance<E>(
    session: &mut Session,
    mut contribution: E,
    mut author: User,
    now: DateTime<Utc>,
) -> Result<Moderated, AppError>
where
    E: Persistent + Contribution,
{
    let id = *contribution.id();
    contribution.accept(now)?;
    session.mapper::<E>().update(contribution)?;

    let count = author.record_accepted(<E as Contribution>::KIND);
    let author_id = author.id;
    session.users().update(author)?;

    let achievement_id = milestones::unlock(session, author_id, Milestone::for_accepted_count(count), now).await?;
    Ok(Moderated {
        contribution_id: id,
        status: ContributionStatus::Accepted,
        achievement_id,
    })
}

async fn accept_add_movie(
    session: &mut Session,
    mut c: AddMovieContribution,
    author: User,
    now: DateTime<Utc>,
) -> Result<Moderated, AppError> {
    ensure_persons_exist(session, &c.referenced_persons()).await?;

    let movie = Movie::create(MovieId::new(), c.movie.clone(), c.photos.clone(), now)?;
    let movie_id = movie.id;
    session.movies().save(movie)?;
    add_credits(session, movie_id, c.roles.clone(), c.writers.clone(), c.crew.clone()).await?;

    c.movie_id = Some(movie_id);
    finish_acceptance(session, c, author, now).await
}

async fn accept_edit_movie(
    session: &mut Session,
    c: EditMovieContribution,
    author: User,
    now: DateTime<Utc>,
) -> Result<Moderated, AppError> {
    let mut movie = session
        .movies()
        .acquire_by_id(c.movie_id)
        .await?
        .ok_or_else(|| AppError::not_found("movie", c.movie_id))?;
    ensure_persons_exist(session, &c.referenced_persons()).await?;

    movie.apply_changes(&c.changes, now)?;
    if !c.photos_to_add.is_empty() || !c.photos_to_remove.is_empty() {
        movie.change_photos(&c.photos_to_add, &c.photos_to_remove, now);
    }
    let movie_id = movie.id;
    session.movies().update(movie)?;

    for id in &c.roles_to_remove {
        let role = session
            .roles()
            .by_id(*id)
            .await?
            .filter(|r| r.movie_id == movie_id)
            .ok_or_else(|| AppError::not_found("role", id))?;
        session.roles().delete(&role)?;
    }
    for id in &c.writers_to_remove {
        let writer = session
            .writers()
            .by_id(*id)
            .await?
            .filter(|w| w.movie_id == movie_id)
            .ok_or_else(|| AppError::not_found("writer", id))?;
        session.writers().delete(&writer)?;
    }
    for id in &c.crew_to_remove {
        let member = session
            .crew()
            .by_id(*id)
            .await?
            .filter(|m| m.movie_id == movie_id)
            .ok_or_else(|| AppError::not_found("crew member", id))?;
        session.crew().delete(&member)?;
    }
    add_credits(
        session,
        movie_id,
        c.roles_to_add.clone(),
        c.writers_to_add.clone(),
        c.crew_to_add.clone(),
    )
    .await?;

    finish_acceptance(session, c, author, now).await
}

async fn accept_add_person(
    session: &mut Session,
    mut c: AddPersonContribution,
    author: User,
    now: DateTime<Utc>,
) -> Result<Moderated, AppError> {
    let person = Person::create(PersonId::new(), c.person.clone(), now)?;
    c.person_id = Some(person.id);
    session.persons().save(person)?;

    finish_acceptance(session, c, author, now).await
}

async fn accept_edit_person(
    session: &mut Session,
    c: EditPersonContribution,
    author: User,
    now: DateTime<Utc>,
) -> Result<Moderated, AppError> {
    let mut person = session
        .persons()
        .acquire_by_id(c.person_id)
        .await?
        .ok_or_else(|| AppError::not_found("person", c.person_id))?;
    person.apply_changes(&c.changes, now)?;
    session.persons().update(person)?;

    finish_acceptance(session, c, author, now).await
}

/// Fails with [`AppError::ReferentialGap`] naming every id that does not resolve.
async fn ensure_persons_exist(session: &mut Session, ids: &[PersonId]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = session.persons().list_by_ids(ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.iter().any(|p| p.id == **id))
        .map(ToString::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ReferentialGap {
            kind: "person",
            missing,
        })
    }
}

async fn add_credits(
    session: &mut Session,
    movie_id: MovieId,
    roles: Vec<RoleDraft>,
    writers: Vec<WriterDraft>,
    crew: Vec<CrewDraft>,
) -> Result<(), AppError> {
    for draft in roles {
        let role = draft.into_role(movie_id);
        let taken = session
            .roles()
            .by_character_and_person(&role.character, role.person_id)
            .await?;
        if taken.is_some() {
            return Err(AppError::AlreadyExists { kind: "role" });
        }
        session.roles().save(role)?;
    }
    for draft in writers {
        let writer = draft.into_writer(movie_id);
        let taken = session
            .writers()
            .by_person_movie_writing(writer.person_id, movie_id, writer.writing)
            .await?;
        if taken.is_some() {
            return Err(AppError::AlreadyExists { kind: "writer" });
        }
        session.writers().save(writer)?;
    }
    for draft in crew {
        session.crew().save(draft.into_crew_member(movie_id))?;
    }
    Ok(())
}
