//! In-memory document store for tests/dev.
//!
//! Models the parts of a transactional document database the persistence
//! layer relies on:
//! - writes are buffered per transaction and applied atomically on commit,
//! - documents written or acquired by a transaction are locked until it ends;
//!   any other transaction touching them fails with a write conflict,
//! - unique indexes are checked on every bulk write and again on commit.
//!
//! Reads see committed state overlaid with the transaction's own writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    BulkWriteResult, Collection, Document, DocumentStore, Filter, ID_FIELD, LOCK_FIELD, StoreError,
    StoreTransaction, WriteOp, index_key,
};

type Docs = BTreeMap<String, Document>;
type Overlay = BTreeMap<String, Option<Document>>;

#[derive(Debug, Default)]
struct Shared {
    collections: HashMap<Collection, Docs>,
    locks: HashMap<(Collection, String), u64>,
    next_txn: u64,
    round_trips: u64,
}

impl Shared {
    fn release(&mut self, txn: u64) {
        self.locks.retain(|_, holder| *holder != txn);
    }
}

/// In-memory store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    shared: Arc<RwLock<Shared>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store round trips issued so far (reads, acquisitions and bulk writes).
    pub fn round_trips(&self) -> u64 {
        self.shared.read().map(|s| s.round_trips).unwrap_or(0)
    }

    /// Committed documents of `collection`, ordered by id.
    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        self.shared
            .read()
            .map(|s| {
                s.collections
                    .get(&collection)
                    .map(|docs| docs.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.documents(collection).len()
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, Shared>, StoreError> {
        self.shared
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let mut shared = self.lock()?;
        shared.next_txn += 1;
        let txn = shared.next_txn;
        tracing::trace!(txn, "begin in-memory transaction");

        Ok(Box::new(InMemoryTransaction {
            txn,
            shared: Arc::clone(&self.shared),
            overlay: HashMap::new(),
            open: true,
        }))
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut shared = self.lock()?;
        shared.round_trips += 1;
        Ok(shared
            .collections
            .get(&collection)
            .and_then(|docs| docs.values().find(|d| filter.matches(d)).cloned()))
    }
}

pub struct InMemoryTransaction {
    txn: u64,
    shared: Arc<RwLock<Shared>>,
    overlay: HashMap<Collection, Overlay>,
    open: bool,
}

fn lock_open(shared: &RwLock<Shared>, open: bool) -> Result<RwLockWriteGuard<'_, Shared>, StoreError> {
    if !open {
        return Err(StoreError::TransactionClosed);
    }
    shared
        .write()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

/// Committed documents of `collection` with `overlay` applied on top.
fn merged_view(shared: &Shared, collection: Collection, overlay: Option<&Overlay>) -> Docs {
    let mut view = shared.collections.get(&collection).cloned().unwrap_or_default();
    if let Some(overlay) = overlay {
        for (id, entry) in overlay {
            match entry {
                Some(doc) => {
                    view.insert(id.clone(), doc.clone());
                }
                None => {
                    view.remove(id);
                }
            }
        }
    }
    view
}

fn check_not_locked_by_other(shared: &Shared, txn: u64, collection: Collection, id: &str) -> Result<(), StoreError> {
    match shared.locks.get(&(collection, id.to_string())) {
        Some(holder) if *holder != txn => Err(StoreError::WriteConflict(format!(
            "{collection}/{id} is locked by another transaction"
        ))),
        _ => Ok(()),
    }
}

/// First secondary unique index violated by one of `touched` within `view`.
fn find_duplicate<'a>(
    collection: Collection,
    view: &Docs,
    touched: impl IntoIterator<Item = &'a String>,
) -> Option<&'static str> {
    let secondary = &collection.unique_indexes()[1..];
    for id in touched {
        let Some(doc) = view.get(id) else { continue };
        for index in secondary {
            let Some(key) = index_key(doc, index) else { continue };
            let clash = view
                .iter()
                .any(|(other_id, other)| other_id != id && index_key(other, index).as_ref() == Some(&key));
            if clash {
                return Some(index.name);
            }
        }
    }
    None
}

fn apply_update(doc: &mut Document, set: &Document, unset: &[String]) {
    for (k, v) in set {
        doc.insert(k.clone(), v.clone());
    }
    for k in unset {
        doc.remove(k);
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn find_one(&mut self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut shared = lock_open(&self.shared, self.open)?;
        shared.round_trips += 1;
        let view = merged_view(&shared, collection, self.overlay.get(&collection));
        Ok(view.into_values().find(|d| filter.matches(d)))
    }

    async fn find_many(&mut self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let mut shared = lock_open(&self.shared, self.open)?;
        shared.round_trips += 1;
        let view = merged_view(&shared, collection, self.overlay.get(&collection));
        Ok(view.into_values().filter(|d| filter.matches(d)).collect())
    }

    async fn acquire(&mut self, collection: Collection, id: &str, token: &str) -> Result<Option<Document>, StoreError> {
        let txn = self.txn;
        let mut shared = lock_open(&self.shared, self.open)?;
        shared.round_trips += 1;
        check_not_locked_by_other(&shared, txn, collection, id)?;

        let view = merged_view(&shared, collection, self.overlay.get(&collection));
        let Some(mut doc) = view.get(id).cloned() else {
            return Ok(None);
        };
        doc.insert(LOCK_FIELD.to_string(), Value::String(token.to_string()));
        shared.locks.insert((collection, id.to_string()), txn);
        drop(shared);

        self.overlay
            .entry(collection)
            .or_default()
            .insert(id.to_string(), Some(doc.clone()));
        Ok(Some(doc))
    }

    async fn bulk_write(&mut self, collection: Collection, ops: Vec<WriteOp>) -> Result<BulkWriteResult, StoreError> {
        let txn = self.txn;
        let mut shared = lock_open(&self.shared, self.open)?;
        shared.round_trips += 1;

        // Stage on a copy so a failing batch leaves the transaction untouched.
        let mut staged = self.overlay.get(&collection).cloned().unwrap_or_default();
        let mut view = merged_view(&shared, collection, Some(&staged));
        let mut result = BulkWriteResult::default();
        let mut touched = Vec::with_capacity(ops.len());

        for op in ops {
            let Some(id) = op.id().map(str::to_string) else {
                return Err(StoreError::Serialization {
                    collection,
                    message: format!("document without string `{ID_FIELD}`"),
                });
            };
            check_not_locked_by_other(&shared, txn, collection, &id)?;

            match op {
                WriteOp::InsertOne { document } => {
                    if view.contains_key(&id) {
                        return Err(StoreError::DuplicateKey {
                            collection,
                            index: collection.id_index().name.to_string(),
                        });
                    }
                    view.insert(id.clone(), document.clone());
                    staged.insert(id.clone(), Some(document));
                    result.inserted += 1;
                }
                WriteOp::UpdateOne { set, unset, .. } => {
                    if let Some(doc) = view.get_mut(&id) {
                        apply_update(doc, &set, &unset);
                        staged.insert(id.clone(), Some(doc.clone()));
                        result.modified += 1;
                    }
                }
                WriteOp::DeleteOne { .. } => {
                    if view.remove(&id).is_some() {
                        staged.insert(id.clone(), None);
                        result.deleted += 1;
                    }
                }
            }
            // Secondary indexes are checked per statement, as Postgres does.
            if let Some(index) = find_duplicate(collection, &view, [&id]) {
                return Err(StoreError::DuplicateKey {
                    collection,
                    index: index.to_string(),
                });
            }
            touched.push(id);
        }

        for id in touched {
            shared.locks.insert((collection, id), txn);
        }
        drop(shared);

        self.overlay.insert(collection, staged);
        Ok(result)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let txn = self.txn;
        let mut shared = lock_open(&self.shared, self.open)?;

        // Another transaction may have committed a clashing key meanwhile.
        let clash = self.overlay.iter().find_map(|(collection, overlay)| {
            let view = merged_view(&shared, *collection, Some(overlay));
            find_duplicate(*collection, &view, overlay.keys()).map(|index| (*collection, index))
        });
        if let Some((collection, index)) = clash {
            shared.release(txn);
            drop(shared);
            self.open = false;
            self.overlay.clear();
            return Err(StoreError::DuplicateKey {
                collection,
                index: index.to_string(),
            });
        }

        for (collection, overlay) in self.overlay.drain() {
            let docs = shared.collections.entry(collection).or_default();
            for (id, entry) in overlay {
                match entry {
                    Some(doc) => {
                        docs.insert(id, doc);
                    }
                    None => {
                        docs.remove(&id);
                    }
                }
            }
        }
        shared.release(txn);
        drop(shared);

        self.open = false;
        tracing::trace!(txn, "committed in-memory transaction");
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        let txn = self.txn;
        let mut shared = lock_open(&self.shared, self.open)?;
        shared.release(txn);
        drop(shared);

        self.overlay.clear();
        self.open = false;
        tracing::trace!(txn, "aborted in-memory transaction");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.open {
            if let Ok(mut shared) = self.shared.write() {
                shared.release(self.txn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn insert(value: Value) -> WriteOp {
        WriteOp::InsertOne { document: doc(value) }
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let store = InMemoryDocumentStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.bulk_write(Collection::Movies, vec![insert(json!({"id": "m1", "eng_title": "Alien"}))])
            .await
            .unwrap();

        assert!(store.find_one(Collection::Movies, &Filter::by_id("m1")).await.unwrap().is_none());
        assert!(txn.find_one(Collection::Movies, &Filter::by_id("m1")).await.unwrap().is_some());

        txn.commit().await.unwrap();
        assert_eq!(store.count(Collection::Movies), 1);
    }

    #[tokio::test]
    async fn abort_discards_writes() {
        let store = InMemoryDocumentStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.bulk_write(Collection::Movies, vec![insert(json!({"id": "m1"}))]).await.unwrap();
        txn.abort().await.unwrap();

        assert_eq!(store.count(Collection::Movies), 0);
        assert!(matches!(
            txn.find_one(Collection::Movies, &Filter::all()).await,
            Err(StoreError::TransactionClosed)
        ));
    }

    #[tokio::test]
    async fn secondary_unique_index_is_enforced() {
        let store = InMemoryDocumentStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.bulk_write(Collection::Users, vec![insert(json!({"id": "u1", "name": "alice", "email": "a@x.io"}))])
            .await
            .unwrap();

        let err = txn
            .bulk_write(Collection::Users, vec![insert(json!({"id": "u2", "name": "alice", "email": "b@x.io"}))])
            .await
            .unwrap_err();
        match err {
            StoreError::DuplicateKey { index, .. } => assert_eq!(index, "users_name"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn secondary_keys_are_checked_per_operation() {
        let store = InMemoryDocumentStore::new();
        let mut seed = store.begin().await.unwrap();
        let old = json!({"id": "r1", "character": "Deckard", "person_id": "p1", "movie_id": "m1"});
        seed.bulk_write(Collection::Roles, vec![insert(old)]).await.unwrap();
        seed.commit().await.unwrap();

        let replacement = json!({"id": "r2", "character": "Deckard", "person_id": "p1", "movie_id": "m1"});
        let mut txn = store.begin().await.unwrap();
        let err = txn
            .bulk_write(
                Collection::Roles,
                vec![insert(replacement.clone()), WriteOp::DeleteOne { id: "r1".into() }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref index, .. } if index == "roles_character_person"));

        let result = txn
            .bulk_write(
                Collection::Roles,
                vec![WriteOp::DeleteOne { id: "r1".into() }, insert(replacement)],
            )
            .await
            .unwrap();
        assert_eq!((result.deleted, result.inserted), (1, 1));
        txn.commit().await.unwrap();
        assert_eq!(store.documents(Collection::Roles)[0]["id"], json!("r2"));
    }

    #[tokio::test]
    async fn unique_index_is_rechecked_on_commit() {
        let store = InMemoryDocumentStore::new();
        let mut a = store.begin().await.unwrap();
        let mut b = store.begin().await.unwrap();
        a.bulk_write(Collection::Users, vec![insert(json!({"id": "u1", "name": "alice", "email": "a@x.io"}))])
            .await
            .unwrap();
        b.bulk_write(Collection::Users, vec![insert(json!({"id": "u2", "name": "alice", "email": "b@x.io"}))])
            .await
            .unwrap();

        a.commit().await.unwrap();
        assert!(matches!(b.commit().await, Err(StoreError::DuplicateKey { .. })));
        assert_eq!(store.count(Collection::Users), 1);
    }

    #[tokio::test]
    async fn acquire_stamps_lock_and_excludes_other_transactions() {
        let store = InMemoryDocumentStore::new();
        let mut seed = store.begin().await.unwrap();
        seed.bulk_write(Collection::Users, vec![insert(json!({"id": "u1", "name": "n", "email": "e@x.io"}))])
            .await
            .unwrap();
        seed.commit().await.unwrap();

        let mut a = store.begin().await.unwrap();
        let acquired = a.acquire(Collection::Users, "u1", "locked").await.unwrap().unwrap();
        assert_eq!(acquired[LOCK_FIELD], json!("locked"));

        let mut b = store.begin().await.unwrap();
        assert!(matches!(
            b.acquire(Collection::Users, "u1", "locked").await,
            Err(StoreError::WriteConflict(_))
        ));

        a.commit().await.unwrap();
        assert!(b.acquire(Collection::Users, "u1", "locked").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn acquiring_a_missing_document_takes_no_lock() {
        let store = InMemoryDocumentStore::new();
        let mut a = store.begin().await.unwrap();
        assert!(a.acquire(Collection::Persons, "p1", "locked").await.unwrap().is_none());

        let mut b = store.begin().await.unwrap();
        b.bulk_write(Collection::Persons, vec![insert(json!({"id": "p1"}))]).await.unwrap();
        b.commit().await.unwrap();
    }

    #[tokio::test]
    async fn dropping_an_open_transaction_releases_locks() {
        let store = InMemoryDocumentStore::new();
        let mut seed = store.begin().await.unwrap();
        seed.bulk_write(Collection::Movies, vec![insert(json!({"id": "m1"}))]).await.unwrap();
        seed.commit().await.unwrap();

        {
            let mut a = store.begin().await.unwrap();
            a.acquire(Collection::Movies, "m1", "locked").await.unwrap();
        }

        let mut b = store.begin().await.unwrap();
        assert!(b.acquire(Collection::Movies, "m1", "locked").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_sets_and_unsets_fields() {
        let store = InMemoryDocumentStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.bulk_write(Collection::EditPersonContributions, vec![insert(json!({"id": "c1", "name": "x", "photo": "p.jpg"}))])
            .await
            .unwrap();
        let mut set = Document::new();
        set.insert("name".into(), json!("y"));
        let result = txn
            .bulk_write(
                Collection::EditPersonContributions,
                vec![WriteOp::UpdateOne { id: "c1".into(), set, unset: vec!["photo".into()] }],
            )
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(result.modified, 1);
        let stored = &store.documents(Collection::EditPersonContributions)[0];
        assert_eq!(stored["name"], json!("y"));
        assert!(!stored.contains_key("photo"));
    }
}
