//! Document store abstraction.
//!
//! Entities are persisted as JSON documents, one collection per entity type.
//! All writes of a request go through one [`StoreTransaction`]; nothing is
//! visible to other transactions until [`StoreTransaction::commit`].
//!
//! Two backends exist:
//! - [`InMemoryDocumentStore`] for tests/dev,
//! - [`PostgresDocumentStore`] storing each collection as a JSONB table.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

/// A stored document: top-level field name to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Field every acquired document gets stamped with.
pub const LOCK_FIELD: &str = "lock";

/// Field holding the document identity in every collection.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Movies,
    Persons,
    Roles,
    Writers,
    CrewMembers,
    AddMovieContributions,
    EditMovieContributions,
    AddPersonContributions,
    EditPersonContributions,
    Achievements,
}

/// A uniqueness constraint over one or more top-level fields.
///
/// Documents missing any of the fields (or holding `null`) are not indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

impl Collection {
    /// Every collection, in unit-of-work commit order.
    pub const ALL: [Collection; 11] = [
        Collection::Users,
        Collection::Movies,
        Collection::Persons,
        Collection::Roles,
        Collection::Writers,
        Collection::CrewMembers,
        Collection::AddMovieContributions,
        Collection::EditMovieContributions,
        Collection::AddPersonContributions,
        Collection::EditPersonContributions,
        Collection::Achievements,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Movies => "movies",
            Self::Persons => "persons",
            Self::Roles => "roles",
            Self::Writers => "writers",
            Self::CrewMembers => "crew_members",
            Self::AddMovieContributions => "add_movie_contributions",
            Self::EditMovieContributions => "edit_movie_contributions",
            Self::AddPersonContributions => "add_person_contributions",
            Self::EditPersonContributions => "edit_person_contributions",
            Self::Achievements => "achievements",
        }
    }

    /// Primary key index, always on [`ID_FIELD`].
    pub fn id_index(&self) -> UniqueIndex {
        self.unique_indexes()[0]
    }

    /// Unique indexes; the first entry is always the id index.
    pub fn unique_indexes(&self) -> &'static [UniqueIndex] {
        match self {
            Self::Users => USERS_INDEXES,
            Self::Movies => MOVIES_INDEXES,
            Self::Persons => PERSONS_INDEXES,
            Self::Roles => ROLES_INDEXES,
            Self::Writers => WRITERS_INDEXES,
            Self::CrewMembers => CREW_MEMBERS_INDEXES,
            Self::AddMovieContributions => ADD_MOVIE_CONTRIBUTIONS_INDEXES,
            Self::EditMovieContributions => EDIT_MOVIE_CONTRIBUTIONS_INDEXES,
            Self::AddPersonContributions => ADD_PERSON_CONTRIBUTIONS_INDEXES,
            Self::EditPersonContributions => EDIT_PERSON_CONTRIBUTIONS_INDEXES,
            Self::Achievements => ACHIEVEMENTS_INDEXES,
        }
    }
}

const fn id_index(name: &'static str) -> UniqueIndex {
    UniqueIndex { name, fields: &[ID_FIELD] }
}

const USERS_INDEXES: &[UniqueIndex] = &[
    id_index("users_id"),
    UniqueIndex { name: "users_name", fields: &["name"] },
    UniqueIndex { name: "users_email", fields: &["email"] },
];

const MOVIES_INDEXES: &[UniqueIndex] = &[id_index("movies_id")];
const PERSONS_INDEXES: &[UniqueIndex] = &[id_index("persons_id")];
const CREW_MEMBERS_INDEXES: &[UniqueIndex] = &[id_index("crew_members_id")];
const ADD_MOVIE_CONTRIBUTIONS_INDEXES: &[UniqueIndex] = &[id_index("add_movie_contributions_id")];
const EDIT_MOVIE_CONTRIBUTIONS_INDEXES: &[UniqueIndex] = &[id_index("edit_movie_contributions_id")];
const ADD_PERSON_CONTRIBUTIONS_INDEXES: &[UniqueIndex] = &[id_index("add_person_contributions_id")];
const EDIT_PERSON_CONTRIBUTIONS_INDEXES: &[UniqueIndex] = &[id_index("edit_person_contributions_id")];

const ROLES_INDEXES: &[UniqueIndex] = &[
    id_index("roles_id"),
    UniqueIndex { name: "roles_character_person", fields: &["character", "person_id"] },
];

const WRITERS_INDEXES: &[UniqueIndex] = &[
    id_index("writers_id"),
    UniqueIndex { name: "writers_person_movie_writing", fields: &["person_id", "movie_id", "writing"] },
];

const ACHIEVEMENTS_INDEXES: &[UniqueIndex] = &[
    id_index("achievements_id"),
    UniqueIndex { name: "achievements_user_achieved", fields: &["user_id", "achieved"] },
];

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
}

impl Clause {
    pub fn field(&self) -> &'static str {
        match self {
            Clause::Eq(field, _) | Clause::In(field, _) => *field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Clause::Eq(field, value) => doc.get(*field) == Some(value),
            Clause::In(field, values) => doc.get(*field).is_some_and(|v| values.contains(v)),
        }
    }
}

/// Conjunction of clauses. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn any_of(field: &'static str, values: Vec<Value>) -> Self {
        Self {
            clauses: vec![Clause::In(field, values)],
        }
    }

    pub fn by_id(id: impl ToString) -> Self {
        Self::eq(ID_FIELD, id.to_string())
    }

    pub fn and_eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field, value.into()));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|c| c.matches(doc))
    }
}

/// A single write inside a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    InsertOne { document: Document },
    UpdateOne { id: String, set: Document, unset: Vec<String> },
    DeleteOne { id: String },
}

impl WriteOp {
    pub fn id(&self) -> Option<&str> {
        match self {
            WriteOp::InsertOne { document } => document.get(ID_FIELD).and_then(Value::as_str),
            WriteOp::UpdateOne { id, .. } | WriteOp::DeleteOne { id } => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub inserted: usize,
    pub modified: usize,
    pub deleted: usize,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key in {collection} (index {index})")]
    DuplicateKey { collection: Collection, index: String },

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("transaction already closed")]
    TransactionClosed,

    #[error("malformed document in {collection}: {message}")]
    Serialization { collection: Collection, message: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Entry point to a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a transaction. Dropping it without commit discards its writes.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Read committed state outside any transaction.
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        (**self).begin().await
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        (**self).find_one(collection, filter).await
    }
}

/// An open store transaction.
///
/// After `commit` or `abort` every further call fails with
/// [`StoreError::TransactionClosed`].
#[async_trait]
pub trait StoreTransaction: Send {
    async fn find_one(&mut self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError>;

    async fn find_many(&mut self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Atomically read the document with `id` and stamp [`LOCK_FIELD`] with
    /// `token`. Returns `None` (and takes no lock) when the document is absent.
    async fn acquire(&mut self, collection: Collection, id: &str, token: &str) -> Result<Option<Document>, StoreError>;

    async fn bulk_write(&mut self, collection: Collection, ops: Vec<WriteOp>) -> Result<BulkWriteResult, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn abort(&mut self) -> Result<(), StoreError>;

    fn is_open(&self) -> bool;
}

/// Key of `doc` under `index`, or `None` when any indexed field is missing or null.
pub(crate) fn index_key(doc: &Document, index: &UniqueIndex) -> Option<Vec<Value>> {
    index
        .fields
        .iter()
        .map(|f| doc.get(*f).filter(|v| !v.is_null()).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn filter_matches_eq_and_in() {
        let d = doc(json!({"id": "a", "status": "pending", "author_id": "u1"}));
        assert!(Filter::eq("status", "pending").and_eq("author_id", "u1").matches(&d));
        assert!(!Filter::eq("status", "accepted").matches(&d));
        assert!(Filter::any_of("id", vec![json!("b"), json!("a")]).matches(&d));
        assert!(Filter::all().matches(&d));
    }

    #[test]
    fn first_unique_index_is_the_id_index() {
        for c in Collection::ALL {
            assert_eq!(c.id_index().fields, &[ID_FIELD]);
        }
    }

    #[test]
    fn null_fields_are_not_indexed() {
        let idx = Collection::Roles.unique_indexes()[1];
        assert!(index_key(&doc(json!({"character": "Ripley", "person_id": null})), &idx).is_none());
        assert_eq!(
            index_key(&doc(json!({"character": "Ripley", "person_id": "p"})), &idx),
            Some(vec![json!("Ripley"), json!("p")])
        );
    }
}
