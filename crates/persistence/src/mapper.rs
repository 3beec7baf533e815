//! Data mappers: typed reads and write intents over a [`Session`].
//!
//! Every read goes through the identity map first, so a document loaded twice
//! in one session yields the same tracked instance. Writes only record intent
//! in the unit of work; nothing reaches the store before commit.

use std::marker::PhantomData;

use tracing::instrument;

use curator_core::{MovieId, PersonId, UserId};
use curator_domain::{
    Achievement, Contribution, ContributionStatus, CrewMember, Milestone, Role, User, Writer, Writing,
};

use crate::error::{PersistenceError, PersistenceResult};
use crate::persistent::{Persistent, wire};
use crate::session::Session;
use crate::store::{Filter, ID_FIELD};

pub struct Mapper<'s, E: Persistent> {
    session: &'s mut Session,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Persistent> Mapper<'s, E> {
    pub(crate) fn new(session: &'s mut Session) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// Tracked instance, or a fresh read. Ids deleted in this session are gone.
    pub async fn by_id(&mut self, id: E::Id) -> PersistenceResult<Option<E>> {
        if self.session.uow.of::<E>().is_deleted(&id) {
            return Ok(None);
        }
        if let Some(tracked) = self.session.maps.of::<E>().by_id(&id) {
            return Ok(Some(tracked.clone()));
        }
        self.find_one(Filter::by_id(id)).await
    }

    pub async fn find_one(&mut self, filter: Filter) -> PersistenceResult<Option<E>> {
        let found = self.session.txn.find_one(E::COLLECTION, &filter).await?;
        match found {
            Some(doc) => self.track(doc),
            None => Ok(None),
        }
    }

    pub async fn find_many(&mut self, filter: Filter) -> PersistenceResult<Vec<E>> {
        let docs = self.session.txn.find_many(E::COLLECTION, &filter).await?;
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            if let Some(entity) = self.track(doc)? {
                out.push(entity);
            }
        }
        Ok(out)
    }

    /// Entities for `ids` in request order; missing ids are skipped.
    ///
    /// When every id is already tracked the store is not consulted. Otherwise
    /// the whole batch is fetched in one query.
    #[instrument(skip(self, ids), fields(collection = %E::COLLECTION, requested = ids.len()), err)]
    pub async fn list_by_ids(&mut self, ids: &[E::Id]) -> PersistenceResult<Vec<E>> {
        let all_tracked = ids.iter().all(|id| self.session.maps.of::<E>().contains(id));
        if !all_tracked {
            let wanted = ids.iter().map(|id| serde_json::Value::from(id.to_string())).collect();
            self.find_many(Filter::any_of(ID_FIELD, wanted)).await?;
        }

        let uow = self.session.uow.of::<E>();
        let map = self.session.maps.of::<E>();
        Ok(ids
            .iter()
            .filter(|id| !uow.is_deleted(id))
            .filter_map(|id| map.by_id(id).cloned())
            .collect())
    }

    /// Read `id` and stamp its lock field inside the session transaction.
    ///
    /// Acquiring twice in one session, or acquiring an entity saved in it,
    /// returns the tracked instance without touching the store. A miss takes
    /// no lock and returns `None`.
    #[instrument(skip(self), fields(collection = %E::COLLECTION), err)]
    pub async fn acquire_by_id(&mut self, id: E::Id) -> PersistenceResult<Option<E>> {
        if self.session.uow.of::<E>().is_deleted(&id) {
            return Ok(None);
        }
        if self.session.maps.of::<E>().is_acquired(&id) {
            return Ok(self.session.maps.of::<E>().by_id(&id).cloned());
        }
        if self.session.uow.of::<E>().new_entities().contains_key(&id) {
            // No row exists before commit; the pending insert is already ours.
            let map = E::identity_map_mut(&mut self.session.maps);
            map.mark_acquired(id);
            return Ok(map.by_id(&id).cloned());
        }

        let token = self.session.locks.token();
        let found = self
            .session
            .txn
            .acquire(E::COLLECTION, &id.to_string(), token.as_str())
            .await?;
        let Some(doc) = found else {
            return Ok(None);
        };
        let fresh = E::from_document(doc)?;

        let pending = self.session.uow.of::<E>().is_pending(&id);
        let map = E::identity_map_mut(&mut self.session.maps);
        if !map.contains(&id) {
            map.save(fresh.clone())?;
            self.session.uow.register_clean(&fresh);
        } else if !pending {
            map.update(fresh.clone())?;
            self.session.uow.register_clean(&fresh);
        }
        map.mark_acquired(id);

        tracing::debug!(%id, "acquired");
        Ok(map.by_id(&id).cloned())
    }

    /// Track a brand-new entity and schedule its insert. Ids deleted in this
    /// session cannot be saved again.
    pub fn save(&mut self, entity: E) -> PersistenceResult<()> {
        if self.session.maps.of::<E>().contains(entity.id()) {
            return E::identity_map_mut(&mut self.session.maps).save(entity);
        }
        self.session.uow.register_new(entity.clone())?;
        E::identity_map_mut(&mut self.session.maps).save(entity)
    }

    /// Replace the tracked instance with `entity` and schedule the update.
    pub fn update(&mut self, entity: E) -> PersistenceResult<()> {
        let id = *entity.id();
        if !self.session.maps.of::<E>().contains(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} updated without being loaded in this session",
                E::KIND
            )));
        }
        self.session.uow.register_dirty(&entity)?;
        E::identity_map_mut(&mut self.session.maps).update(entity)
    }

    /// Schedule the delete and stop tracking `entity`.
    pub fn delete(&mut self, entity: &E) -> PersistenceResult<()> {
        self.session.uow.register_deleted(entity)?;
        E::identity_map_mut(&mut self.session.maps).remove(entity.id());
        Ok(())
    }

    /// Map a document read from the store to the session's instance for its
    /// id. Already-tracked entities win over the fresh read.
    fn track(&mut self, doc: crate::store::Document) -> PersistenceResult<Option<E>> {
        let fresh = E::from_document(doc)?;
        let id = *fresh.id();
        if self.session.uow.of::<E>().is_deleted(&id) {
            return Ok(None);
        }
        if let Some(tracked) = self.session.maps.of::<E>().by_id(&id) {
            return Ok(Some(tracked.clone()));
        }
        E::identity_map_mut(&mut self.session.maps).save(fresh.clone())?;
        self.session.uow.register_clean(&fresh);
        Ok(Some(fresh))
    }
}

impl Mapper<'_, User> {
    pub async fn by_name(&mut self, name: &str) -> PersistenceResult<Option<User>> {
        self.find_one(Filter::eq("name", name.trim())).await
    }

    /// Emails are stored lower-cased.
    pub async fn by_email(&mut self, email: &str) -> PersistenceResult<Option<User>> {
        self.find_one(Filter::eq("email", email.trim().to_ascii_lowercase())).await
    }
}

impl Mapper<'_, Achievement> {
    pub async fn by_user_and_milestone(
        &mut self,
        user_id: UserId,
        achieved: Milestone,
    ) -> PersistenceResult<Option<Achievement>> {
        let filter = Filter::eq("user_id", wire(Achievement::KIND, &user_id)?)
            .and_eq("achieved", wire(Achievement::KIND, &achieved)?);
        self.find_one(filter).await
    }

    pub async fn list_by_user(&mut self, user_id: UserId) -> PersistenceResult<Vec<Achievement>> {
        self.find_many(Filter::eq("user_id", wire(Achievement::KIND, &user_id)?))
            .await
    }
}

impl Mapper<'_, Role> {
    pub async fn by_character_and_person(
        &mut self,
        character: &str,
        person_id: PersonId,
    ) -> PersistenceResult<Option<Role>> {
        let filter = Filter::eq("character", character).and_eq("person_id", wire(Role::KIND, &person_id)?);
        self.find_one(filter).await
    }

    pub async fn list_by_movie(&mut self, movie_id: MovieId) -> PersistenceResult<Vec<Role>> {
        self.find_many(Filter::eq("movie_id", wire(Role::KIND, &movie_id)?)).await
    }
}

impl Mapper<'_, Writer> {
    pub async fn by_person_movie_writing(
        &mut self,
        person_id: PersonId,
        movie_id: MovieId,
        writing: Writing,
    ) -> PersistenceResult<Option<Writer>> {
        let filter = Filter::eq("person_id", wire(Writer::KIND, &person_id)?)
            .and_eq("movie_id", wire(Writer::KIND, &movie_id)?)
            .and_eq("writing", wire(Writer::KIND, &writing)?);
        self.find_one(filter).await
    }

    pub async fn list_by_movie(&mut self, movie_id: MovieId) -> PersistenceResult<Vec<Writer>> {
        self.find_many(Filter::eq("movie_id", wire(Writer::KIND, &movie_id)?)).await
    }
}

impl Mapper<'_, CrewMember> {
    pub async fn list_by_movie(&mut self, movie_id: MovieId) -> PersistenceResult<Vec<CrewMember>> {
        self.find_many(Filter::eq("movie_id", wire(CrewMember::KIND, &movie_id)?))
            .await
    }
}

impl<E: Persistent + Contribution> Mapper<'_, E> {
    pub async fn list_by_author(&mut self, author_id: UserId) -> PersistenceResult<Vec<E>> {
        let author = wire(<E as Persistent>::KIND, &author_id)?;
        self.find_many(Filter::eq("author_id", author)).await
    }

    pub async fn list_by_status(&mut self, status: ContributionStatus) -> PersistenceResult<Vec<E>> {
        self.find_many(Filter::eq("status", status.as_str())).await
    }
}
