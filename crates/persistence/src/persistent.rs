//! Binding between a domain entity and its collection.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use curator_core::Entity;

use crate::committer::CollectionCommitter;
use crate::error::{PersistenceError, PersistenceResult};
use crate::identity_map::{IdentityMap, IdentityMaps};
use crate::store::{Collection, Document};
use crate::unit_of_work::{ChangeSet, UnitOfWork};

/// An entity type the session can track and commit.
pub trait Persistent: Entity + Clone + core::fmt::Debug + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Short name used in errors and logs.
    const KIND: &'static str;

    type Committer: CollectionCommitter<Self> + Default;

    /// Full document for this entity. Never contains the lock field.
    fn to_document(&self) -> PersistenceResult<Document>;

    /// Rebuild the entity; unknown fields (such as the lock stamp) are ignored.
    fn from_document(doc: Document) -> PersistenceResult<Self>;

    fn identity_map(maps: &IdentityMaps) -> &IdentityMap<Self>;
    fn identity_map_mut(maps: &mut IdentityMaps) -> &mut IdentityMap<Self>;
    fn changes(uow: &UnitOfWork) -> &ChangeSet<Self>;
    fn changes_mut(uow: &mut UnitOfWork) -> &mut ChangeSet<Self>;
}

pub(crate) fn encode<D: Serialize>(kind: &'static str, doc: &D) -> PersistenceResult<Document> {
    match serde_json::to_value(doc).map_err(|e| PersistenceError::mapping(kind, e))? {
        Value::Object(map) => Ok(map),
        other => Err(PersistenceError::mapping(kind, format!("expected object, found {other}"))),
    }
}

pub(crate) fn decode<D: DeserializeOwned>(kind: &'static str, doc: Document) -> PersistenceResult<D> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| PersistenceError::mapping(kind, e))
}

/// JSON wire value of `value`, for building filters.
pub(crate) fn wire<T: Serialize + ?Sized>(kind: &'static str, value: &T) -> PersistenceResult<Value> {
    serde_json::to_value(value).map_err(|e| PersistenceError::mapping(kind, e))
}

/// Implements [`Persistent`] for `$entity` through the document struct `$doc`,
/// which must convert `From<&$entity>` and into `$entity`.
macro_rules! persistent {
    ($entity:ty, $doc:ty, $collection:expr, $kind:literal, $committer:ty, $field:ident) => {
        impl $crate::persistent::Persistent for $entity {
            const COLLECTION: $crate::store::Collection = $collection;
            const KIND: &'static str = $kind;

            type Committer = $committer;

            fn to_document(&self) -> $crate::error::PersistenceResult<$crate::store::Document> {
                $crate::persistent::encode($kind, &<$doc>::from(self))
            }

            fn from_document(doc: $crate::store::Document) -> $crate::error::PersistenceResult<Self> {
                $crate::persistent::decode::<$doc>($kind, doc).map(Into::into)
            }

            fn identity_map(maps: &$crate::identity_map::IdentityMaps) -> &$crate::identity_map::IdentityMap<Self> {
                &maps.$field
            }

            fn identity_map_mut(
                maps: &mut $crate::identity_map::IdentityMaps,
            ) -> &mut $crate::identity_map::IdentityMap<Self> {
                &mut maps.$field
            }

            fn changes(uow: &$crate::unit_of_work::UnitOfWork) -> &$crate::unit_of_work::ChangeSet<Self> {
                &uow.$field
            }

            fn changes_mut(uow: &mut $crate::unit_of_work::UnitOfWork) -> &mut $crate::unit_of_work::ChangeSet<Self> {
                &mut uow.$field
            }
        }
    };
}
pub(crate) use persistent;
