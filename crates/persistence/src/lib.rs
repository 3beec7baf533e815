//! `curator-persistence` - transactional document persistence.
//!
//! A [`Session`] wraps one store transaction with per-type identity maps and a
//! unit of work. Mappers read through the identity map and record write
//! intents; [`Session::commit`] turns those intents into minimal bulk writes,
//! one collection at a time, inside the same transaction.

pub mod committer;
pub mod documents;
pub mod error;
pub mod identity_map;
pub mod lock;
pub mod mapper;
pub mod persistent;
pub mod session;
pub mod store;
pub mod unit_of_work;

pub use committer::{
    AchievementCommitter, CollectionCommitter, DocumentCommitter, RoleCommitter, UserCommitter, WriterCommitter,
    diff_documents, plan_writes,
};
pub use error::{PersistenceError, PersistenceResult, UserField};
pub use identity_map::{IdentityMap, IdentityMaps};
pub use lock::{ConstantLockFactory, LockFactory, LockToken, UuidLockFactory};
pub use mapper::Mapper;
pub use persistent::Persistent;
pub use session::Session;
pub use store::{
    BulkWriteResult, Collection, Document, DocumentStore, Filter, InMemoryDocumentStore, PostgresDocumentStore,
    StoreError, StoreTransaction, WriteOp,
};
pub use unit_of_work::{ChangeSet, CommitReport, UnitOfWork};
