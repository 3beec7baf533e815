//! Collection committers: turn a change set into store writes.
//!
//! Planning is pure. Deleted entities become deletes by id, each dirty entity
//! is diffed against its clean snapshot field by field so only changed fields
//! reach the store, and new entities become full-document inserts.

use curator_domain::{Achievement, Role, User, Writer};

use crate::error::{PersistenceError, PersistenceResult, UserField};
use crate::persistent::Persistent;
use crate::store::{BulkWriteResult, Collection, Document, ID_FIELD, StoreError, StoreTransaction, WriteOp};
use crate::unit_of_work::ChangeSet;

pub trait CollectionCommitter<E: Persistent>: Send + Sync {
    fn plan(&self, changes: &ChangeSet<E>) -> PersistenceResult<Vec<WriteOp>> {
        plan_writes(changes)
    }

    /// Translate a duplicate-key failure into a domain-facing error.
    fn reclassify(&self, err: StoreError) -> PersistenceError {
        PersistenceError::Store(err)
    }
}

/// Committer with no special error handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCommitter;

impl<E: Persistent> CollectionCommitter<E> for DocumentCommitter {}

/// Maps user unique-index collisions to [`PersistenceError::AlreadyTaken`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCommitter;

impl CollectionCommitter<User> for UserCommitter {
    fn reclassify(&self, err: StoreError) -> PersistenceError {
        let field = match &err {
            StoreError::DuplicateKey { index, .. } => match index.as_str() {
                "users_id" => Some(UserField::Id),
                "users_name" => Some(UserField::Name),
                "users_email" => Some(UserField::Email),
                _ => None,
            },
            _ => None,
        };
        match field {
            Some(field) => PersistenceError::AlreadyTaken(field),
            None => PersistenceError::Store(err),
        }
    }
}

/// Maps a repeated (user, milestone) pair to [`PersistenceError::AlreadyExists`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievementCommitter;

impl CollectionCommitter<Achievement> for AchievementCommitter {
    fn reclassify(&self, err: StoreError) -> PersistenceError {
        match err {
            StoreError::DuplicateKey { .. } => PersistenceError::AlreadyExists { kind: Achievement::KIND },
            other => PersistenceError::Store(other),
        }
    }
}

/// Maps a repeated (character, person) pair to [`PersistenceError::AlreadyExists`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCommitter;

impl CollectionCommitter<Role> for RoleCommitter {
    fn reclassify(&self, err: StoreError) -> PersistenceError {
        already_exists_on(err, "roles_character_person", Role::KIND)
    }
}

/// Maps a repeated (person, movie, writing) triple to [`PersistenceError::AlreadyExists`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterCommitter;

impl CollectionCommitter<Writer> for WriterCommitter {
    fn reclassify(&self, err: StoreError) -> PersistenceError {
        already_exists_on(err, "writers_person_movie_writing", Writer::KIND)
    }
}

/// Collisions on the id index stay store errors; only the natural key is a
/// domain-level duplicate.
fn already_exists_on(err: StoreError, natural_key: &str, kind: &'static str) -> PersistenceError {
    let on_natural_key = matches!(&err, StoreError::DuplicateKey { index, .. } if index == natural_key);
    if on_natural_key {
        PersistenceError::AlreadyExists { kind }
    } else {
        PersistenceError::Store(err)
    }
}

/// Reclassify a duplicate-key failure raised at transaction commit, when the
/// collection is only known from the error itself.
pub(crate) fn reclassify_commit_error(err: StoreError) -> PersistenceError {
    let collection = match &err {
        StoreError::DuplicateKey { collection, .. } => Some(*collection),
        _ => None,
    };
    match collection {
        Some(Collection::Users) => UserCommitter.reclassify(err),
        Some(Collection::Roles) => RoleCommitter.reclassify(err),
        Some(Collection::Writers) => WriterCommitter.reclassify(err),
        Some(Collection::Achievements) => AchievementCommitter.reclassify(err),
        _ => PersistenceError::Store(err),
    }
}

/// Deletes, field-level updates and inserts for `changes`, in that order.
///
/// Unique indexes are checked per statement, so a key released by a delete or
/// an update must be gone before an insert claims it again.
pub fn plan_writes<E: Persistent>(changes: &ChangeSet<E>) -> PersistenceResult<Vec<WriteOp>> {
    let mut ops = Vec::with_capacity(changes.new.len() + changes.dirty.len() + changes.deleted.len());

    for id in changes.deleted.keys() {
        ops.push(WriteOp::DeleteOne { id: id.to_string() });
    }

    // Pairs are matched by id, not by position.
    for (id, dirty) in &changes.dirty {
        let clean = changes.clean.get(id).ok_or_else(|| {
            PersistenceError::consistency(format!("{} {id} is dirty without a clean baseline", E::KIND))
        })?;
        if let Some(op) = diff_documents(&id.to_string(), &clean.to_document()?, &dirty.to_document()?) {
            ops.push(op);
        }
    }

    for entity in changes.new.values() {
        ops.push(WriteOp::InsertOne {
            document: entity.to_document()?,
        });
    }

    Ok(ops)
}

/// Field-level update turning `clean` into `dirty`, or `None` when they agree.
///
/// Fields present in `dirty` with a different (or no) value in `clean` are
/// set; fields present only in `clean` are unset. The id is never touched.
pub fn diff_documents(id: &str, clean: &Document, dirty: &Document) -> Option<WriteOp> {
    let set: Document = dirty
        .iter()
        .filter(|(k, v)| k.as_str() != ID_FIELD && clean.get(k.as_str()) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let unset: Vec<String> = clean
        .keys()
        .filter(|k| k.as_str() != ID_FIELD && !dirty.contains_key(k.as_str()))
        .cloned()
        .collect();

    if set.is_empty() && unset.is_empty() {
        return None;
    }
    Some(WriteOp::UpdateOne {
        id: id.to_string(),
        set,
        unset,
    })
}

/// Plan and execute `changes` through one bulk write inside `txn`.
///
/// On a duplicate-key failure the transaction is aborted before the error is
/// reclassified by the type's committer.
pub async fn commit_collection<E: Persistent>(
    txn: &mut dyn StoreTransaction,
    changes: &ChangeSet<E>,
) -> PersistenceResult<BulkWriteResult> {
    let committer = E::Committer::default();
    let ops = committer.plan(changes)?;
    if ops.is_empty() {
        return Ok(BulkWriteResult::default());
    }

    let count = ops.len();
    match txn.bulk_write(E::COLLECTION, ops).await {
        Ok(result) => {
            tracing::debug!(collection = %E::COLLECTION, ops = count, "collection committed");
            Ok(result)
        }
        Err(err @ StoreError::DuplicateKey { .. }) => {
            if let Err(abort_err) = txn.abort().await {
                tracing::warn!(collection = %E::COLLECTION, error = %abort_err, "abort after duplicate key failed");
            }
            Err(committer.reclassify(err))
        }
        Err(err) => Err(err.into()),
    }
}
