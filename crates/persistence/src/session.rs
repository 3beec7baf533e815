//! A session: one store transaction plus the identity maps and unit of work
//! that sit in front of it.
//!
//! Sessions are single-owner. A request opens one, reads and records writes
//! through its mappers, then either commits or aborts it. Dropping a session
//! without committing discards its transaction.

use std::sync::Arc;

use tracing::instrument;

use curator_domain::{
    Achievement, AddMovieContribution, AddPersonContribution, CrewMember, EditMovieContribution,
    EditPersonContribution, Movie, Person, Role, User, Writer,
};

use crate::committer::reclassify_commit_error;
use crate::error::PersistenceResult;
use crate::identity_map::IdentityMaps;
use crate::lock::LockFactory;
use crate::mapper::Mapper;
use crate::persistent::Persistent;
use crate::store::{DocumentStore, StoreTransaction};
use crate::unit_of_work::{CommitReport, UnitOfWork};

pub struct Session {
    pub(crate) txn: Box<dyn StoreTransaction>,
    pub(crate) maps: IdentityMaps,
    pub(crate) uow: UnitOfWork,
    pub(crate) locks: Arc<dyn LockFactory>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.txn.is_open())
            .field("maps", &self.maps)
            .field("uow", &self.uow)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn begin(store: &dyn DocumentStore, locks: Arc<dyn LockFactory>) -> PersistenceResult<Self> {
        let txn = store.begin().await?;
        Ok(Self {
            txn,
            maps: IdentityMaps::default(),
            uow: UnitOfWork::default(),
            locks,
        })
    }

    pub fn mapper<E: Persistent>(&mut self) -> Mapper<'_, E> {
        Mapper::new(self)
    }

    pub fn users(&mut self) -> Mapper<'_, User> {
        self.mapper()
    }

    pub fn movies(&mut self) -> Mapper<'_, Movie> {
        self.mapper()
    }

    pub fn persons(&mut self) -> Mapper<'_, Person> {
        self.mapper()
    }

    pub fn roles(&mut self) -> Mapper<'_, Role> {
        self.mapper()
    }

    pub fn writers(&mut self) -> Mapper<'_, Writer> {
        self.mapper()
    }

    pub fn crew(&mut self) -> Mapper<'_, CrewMember> {
        self.mapper()
    }

    pub fn add_movie_contributions(&mut self) -> Mapper<'_, AddMovieContribution> {
        self.mapper()
    }

    pub fn edit_movie_contributions(&mut self) -> Mapper<'_, EditMovieContribution> {
        self.mapper()
    }

    pub fn add_person_contributions(&mut self) -> Mapper<'_, AddPersonContribution> {
        self.mapper()
    }

    pub fn edit_person_contributions(&mut self) -> Mapper<'_, EditPersonContribution> {
        self.mapper()
    }

    pub fn achievements(&mut self) -> Mapper<'_, Achievement> {
        self.mapper()
    }

    pub fn identity_maps(&self) -> &IdentityMaps {
        &self.maps
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }

    /// Flush the unit of work and commit the transaction. On any failure the
    /// transaction is aborted and nothing is persisted.
    #[instrument(skip_all, err)]
    pub async fn commit(mut self) -> PersistenceResult<CommitReport> {
        let report = match self.uow.commit(&mut *self.txn).await {
            Ok(report) => report,
            Err(err) => {
                self.rollback().await;
                return Err(err);
            }
        };

        if let Err(err) = self.txn.commit().await {
            self.rollback().await;
            return Err(reclassify_commit_error(err));
        }
        Ok(report)
    }

    pub async fn abort(mut self) -> PersistenceResult<()> {
        if self.txn.is_open() {
            self.txn.abort().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) {
        if !self.txn.is_open() {
            return;
        }
        if let Err(err) = self.txn.abort().await {
            tracing::warn!(error = %err, "abort after failed commit failed");
        }
    }
}
