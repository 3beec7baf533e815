//! Unit of work: the write intents of one session.
//!
//! Per entity type the unit of work keeps four sets keyed by id:
//! - `new`: entities to insert,
//! - `clean`: snapshots taken when an entity was read (the diff baseline),
//! - `dirty`: latest state of entities registered for update,
//! - `deleted`: entities to delete.
//!
//! Clean snapshots are owned copies and are never mutated after registration.

use std::collections::BTreeMap;

use tracing::instrument;

use curator_domain::{
    Achievement, AddMovieContribution, AddPersonContribution, CrewMember, EditMovieContribution,
    EditPersonContribution, Movie, Person, Role, User, Writer,
};

use crate::committer::commit_collection;
use crate::error::{PersistenceError, PersistenceResult};
use crate::persistent::Persistent;
use crate::store::{BulkWriteResult, Collection, StoreTransaction};

#[derive(Debug)]
pub struct ChangeSet<E: Persistent> {
    pub(crate) new: BTreeMap<E::Id, E>,
    pub(crate) clean: BTreeMap<E::Id, E>,
    pub(crate) dirty: BTreeMap<E::Id, E>,
    pub(crate) deleted: BTreeMap<E::Id, E>,
}

impl<E: Persistent> Default for ChangeSet<E> {
    fn default() -> Self {
        Self {
            new: BTreeMap::new(),
            clean: BTreeMap::new(),
            dirty: BTreeMap::new(),
            deleted: BTreeMap::new(),
        }
    }
}

impl<E: Persistent> ChangeSet<E> {
    pub fn new_entities(&self) -> &BTreeMap<E::Id, E> {
        &self.new
    }

    pub fn clean(&self) -> &BTreeMap<E::Id, E> {
        &self.clean
    }

    pub fn dirty(&self) -> &BTreeMap<E::Id, E> {
        &self.dirty
    }

    pub fn deleted(&self) -> &BTreeMap<E::Id, E> {
        &self.deleted
    }

    pub fn is_deleted(&self, id: &E::Id) -> bool {
        self.deleted.contains_key(id)
    }

    /// Registered for insert or update.
    pub fn is_pending(&self, id: &E::Id) -> bool {
        self.new.contains_key(id) || self.dirty.contains_key(id)
    }

    /// Nothing to write.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.dirty.is_empty() && self.deleted.is_empty()
    }

    /// Schedule an insert. An id already tracked by this change set, or
    /// deleted in it, cannot be inserted again.
    pub fn register_new(&mut self, entity: E) -> PersistenceResult<()> {
        let id = *entity.id();
        if self.deleted.contains_key(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} saved after being deleted",
                E::KIND
            )));
        }
        if self.new.contains_key(&id) || self.clean.contains_key(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} saved while already tracked",
                E::KIND
            )));
        }
        self.new.insert(id, entity);
        Ok(())
    }

    pub fn register_clean(&mut self, entity: &E) {
        self.clean.insert(*entity.id(), entity.clone());
    }

    /// Pending inserts absorb the new state; everything else needs a clean
    /// baseline to diff against.
    pub fn register_dirty(&mut self, entity: &E) -> PersistenceResult<()> {
        let id = *entity.id();
        if let Some(pending) = self.new.get_mut(&id) {
            *pending = entity.clone();
            return Ok(());
        }
        if self.deleted.contains_key(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} updated after being deleted",
                E::KIND
            )));
        }
        if !self.clean.contains_key(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} registered dirty without a clean baseline",
                E::KIND
            )));
        }
        self.dirty.insert(id, entity.clone());
        Ok(())
    }

    pub fn register_deleted(&mut self, entity: &E) -> PersistenceResult<()> {
        let id = *entity.id();
        if self.new.remove(&id).is_some() {
            return Ok(());
        }
        if self.dirty.remove(&id).is_some() && self.clean.remove(&id).is_none() {
            return Err(PersistenceError::consistency(format!(
                "{} {id} was dirty without a clean baseline",
                E::KIND
            )));
        }
        self.deleted.insert(id, entity.clone());
        Ok(())
    }
}

/// What a commit wrote.
#[derive(Debug, Clone, Default)]
pub struct CommitReport {
    pub writes: Vec<(Collection, BulkWriteResult)>,
    /// Users inserted or updated, in their committed state.
    pub users: Vec<User>,
}

impl CommitReport {
    pub fn total_writes(&self) -> usize {
        self.writes
            .iter()
            .map(|(_, r)| r.inserted + r.modified + r.deleted)
            .sum()
    }
}

#[derive(Debug, Default)]
pub struct UnitOfWork {
    pub(crate) users: ChangeSet<User>,
    pub(crate) movies: ChangeSet<Movie>,
    pub(crate) persons: ChangeSet<Person>,
    pub(crate) roles: ChangeSet<Role>,
    pub(crate) writers: ChangeSet<Writer>,
    pub(crate) crew_members: ChangeSet<CrewMember>,
    pub(crate) add_movie_contributions: ChangeSet<AddMovieContribution>,
    pub(crate) edit_movie_contributions: ChangeSet<EditMovieContribution>,
    pub(crate) add_person_contributions: ChangeSet<AddPersonContribution>,
    pub(crate) edit_person_contributions: ChangeSet<EditPersonContribution>,
    pub(crate) achievements: ChangeSet<Achievement>,
}

impl UnitOfWork {
    pub fn of<E: Persistent>(&self) -> &ChangeSet<E> {
        E::changes(self)
    }

    pub fn register_new<E: Persistent>(&mut self, entity: E) -> PersistenceResult<()> {
        E::changes_mut(self).register_new(entity)
    }

    pub fn register_clean<E: Persistent>(&mut self, entity: &E) {
        E::changes_mut(self).register_clean(entity);
    }

    pub fn register_dirty<E: Persistent>(&mut self, entity: &E) -> PersistenceResult<()> {
        E::changes_mut(self).register_dirty(entity)
    }

    pub fn register_deleted<E: Persistent>(&mut self, entity: &E) -> PersistenceResult<()> {
        E::changes_mut(self).register_deleted(entity)
    }

    /// Write every pending change through `txn`, one collection at a time in
    /// a fixed order. Does not commit `txn`.
    #[instrument(skip_all, err)]
    pub async fn commit(&self, txn: &mut dyn StoreTransaction) -> PersistenceResult<CommitReport> {
        let mut report = CommitReport {
            writes: Vec::with_capacity(Collection::ALL.len()),
            users: self
                .users
                .new
                .values()
                .chain(self.users.dirty.values())
                .cloned()
                .collect(),
        };

        report.writes.push(step(txn, &self.users).await?);
        report.writes.push(step(txn, &self.movies).await?);
        report.writes.push(step(txn, &self.persons).await?);
        report.writes.push(step(txn, &self.roles).await?);
        report.writes.push(step(txn, &self.writers).await?);
        report.writes.push(step(txn, &self.crew_members).await?);
        report.writes.push(step(txn, &self.add_movie_contributions).await?);
        report.writes.push(step(txn, &self.edit_movie_contributions).await?);
        report.writes.push(step(txn, &self.add_person_contributions).await?);
        report.writes.push(step(txn, &self.edit_person_contributions).await?);
        report.writes.push(step(txn, &self.achievements).await?);

        tracing::debug!(writes = report.total_writes(), "unit of work flushed");
        Ok(report)
    }
}

async fn step<E: Persistent>(
    txn: &mut dyn StoreTransaction,
    changes: &ChangeSet<E>,
) -> PersistenceResult<(Collection, BulkWriteResult)> {
    let result = commit_collection(txn, changes).await?;
    Ok((E::COLLECTION, result))
}
