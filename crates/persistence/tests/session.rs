use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use curator_auth::Permissions;
use curator_core::{MovieId, PersonId, UserId};
use curator_domain::{Achievement, Milestone, NewPerson, Person, RoleDraft, User};
use curator_persistence::{
    Collection, ConstantLockFactory, InMemoryDocumentStore, LockFactory, PersistenceError, Session, StoreError,
    UserField,
};

fn locks() -> Arc<dyn LockFactory> {
    Arc::new(ConstantLockFactory::default())
}

fn user(name: &str) -> User {
    User::register(UserId::new(), name, format!("{name}@example.com"), Permissions::CONTRIBUTOR, Utc::now()).unwrap()
}

async fn seed_user(store: &InMemoryDocumentStore, name: &str) -> User {
    let u = user(name);
    let mut session = Session::begin(store, locks()).await.unwrap();
    session.users().save(u.clone()).unwrap();
    session.commit().await.unwrap();
    u
}

#[tokio::test]
async fn reads_of_one_id_return_the_tracked_instance() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let mut first = session.users().by_id(alice.id).await.unwrap().unwrap();
    first.rating = 7;
    session.users().update(first).unwrap();

    let before = store.round_trips();
    let again = session.users().by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(store.round_trips(), before);
    assert_eq!(again.rating, 7);

    // A lookup by another key maps onto the same tracked instance.
    let by_name = session.users().by_name("alice").await.unwrap().unwrap();
    assert_eq!(by_name.rating, 7);
    assert_eq!(session.identity_maps().of::<User>().len(), 1);
}

#[tokio::test]
async fn update_writes_only_the_changed_field() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let mut u = session.users().by_id(alice.id).await.unwrap().unwrap();
    u.rating = 3;
    session.users().update(u).unwrap();
    let report = session.commit().await.unwrap();

    assert_eq!(report.total_writes(), 1);
    assert_eq!(report.users.len(), 1);
    let stored = &store.documents(Collection::Users)[0];
    assert_eq!(stored["rating"], json!(3));
    assert_eq!(stored["email"], json!("alice@example.com"));
}

#[tokio::test]
async fn acquiring_twice_hits_the_store_once() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let before = store.round_trips();
    let first = session.users().acquire_by_id(alice.id).await.unwrap();
    let second = session.users().acquire_by_id(alice.id).await.unwrap();

    assert_eq!(store.round_trips(), before + 1);
    assert_eq!(first, second);
    assert!(session.identity_maps().of::<User>().is_acquired(&alice.id));

    session.commit().await.unwrap();
    assert_eq!(store.documents(Collection::Users)[0]["lock"], json!("locked"));
}

#[tokio::test]
async fn acquiring_a_missing_id_takes_no_lock() {
    let store = InMemoryDocumentStore::new();
    let mut session = Session::begin(&store, locks()).await.unwrap();

    assert!(session.users().acquire_by_id(UserId::new()).await.unwrap().is_none());
    session.commit().await.unwrap();
    assert_eq!(store.count(Collection::Users), 0);
}

#[tokio::test]
async fn a_second_session_cannot_acquire_a_held_document() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut holder = Session::begin(&store, locks()).await.unwrap();
    holder.users().acquire_by_id(alice.id).await.unwrap().unwrap();

    let mut other = Session::begin(&store, locks()).await.unwrap();
    let err = other.users().acquire_by_id(alice.id).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Store(StoreError::WriteConflict(_))));

    holder.abort().await.unwrap();
    let mut retry = Session::begin(&store, locks()).await.unwrap();
    assert!(retry.users().acquire_by_id(alice.id).await.unwrap().is_some());
}

#[tokio::test]
async fn taken_email_is_reported_by_field() {
    let store = InMemoryDocumentStore::new();
    seed_user(&store, "alice").await;

    let mut imposter = user("alice2");
    imposter.email = "alice@example.com".into();
    let mut session = Session::begin(&store, locks()).await.unwrap();
    session.users().save(imposter).unwrap();

    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyTaken(UserField::Email)));
    assert_eq!(store.count(Collection::Users), 1);
}

#[tokio::test]
async fn a_failing_collection_discards_every_earlier_write() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;
    {
        let mut session = Session::begin(&store, locks()).await.unwrap();
        session
            .achievements()
            .save(Achievement::unlock(alice.id, Milestone::Accepted1, Utc::now()))
            .unwrap();
        session.commit().await.unwrap();
    }

    let mut session = Session::begin(&store, locks()).await.unwrap();
    session.users().save(user("bob")).unwrap();
    let person = Person::create(
        PersonId::new(),
        NewPerson {
            name: "Ridley Scott".into(),
            en_name: None,
            sex: None,
            birth_date: None,
            death_date: None,
            photo: None,
        },
        Utc::now(),
    )
    .unwrap();
    session.persons().save(person).unwrap();
    session
        .achievements()
        .save(Achievement::unlock(alice.id, Milestone::Accepted1, Utc::now()))
        .unwrap();

    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyExists { kind: "achievement" }));
    assert_eq!(store.count(Collection::Users), 1);
    assert_eq!(store.count(Collection::Persons), 0);
    assert_eq!(store.count(Collection::Achievements), 1);
}

#[tokio::test]
async fn list_by_ids_skips_the_store_when_everything_is_tracked() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;
    let bob = seed_user(&store, "bob").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let fetched = session.users().list_by_ids(&[bob.id, alice.id, UserId::new()]).await.unwrap();
    assert_eq!(fetched.iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id, alice.id]);

    let before = store.round_trips();
    let cached = session.users().list_by_ids(&[alice.id, bob.id]).await.unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(store.round_trips(), before);
}

#[tokio::test]
async fn deleted_entities_disappear_from_the_session_and_the_store() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let u = session.users().by_id(alice.id).await.unwrap().unwrap();
    session.users().delete(&u).unwrap();
    assert!(session.users().by_id(alice.id).await.unwrap().is_none());
    assert!(session.users().by_email("ALICE@example.com").await.unwrap().is_none());

    session.commit().await.unwrap();
    assert_eq!(store.count(Collection::Users), 0);
}

#[tokio::test]
async fn a_deleted_id_cannot_be_saved_again_in_the_same_session() {
    let store = InMemoryDocumentStore::new();
    let alice = seed_user(&store, "alice").await;

    let mut session = Session::begin(&store, locks()).await.unwrap();
    let u = session.users().by_id(alice.id).await.unwrap().unwrap();
    session.users().delete(&u).unwrap();

    let mut revived = u.clone();
    revived.rating = 99;
    let err = session.users().save(revived).unwrap_err();
    assert!(matches!(err, PersistenceError::ConsistencyViolation(_)));
    assert!(session.unit_of_work().of::<User>().new_entities().is_empty());
    assert!(session.users().by_id(alice.id).await.unwrap().is_none());

    session.commit().await.unwrap();
    assert_eq!(store.count(Collection::Users), 0);
}

#[tokio::test]
async fn acquiring_an_entity_saved_in_this_session_returns_it() {
    let store = InMemoryDocumentStore::new();
    let bob = user("bob");

    let mut session = Session::begin(&store, locks()).await.unwrap();
    session.users().save(bob.clone()).unwrap();

    let before = store.round_trips();
    let acquired = session.users().acquire_by_id(bob.id).await.unwrap();
    assert_eq!(acquired, Some(bob.clone()));
    assert_eq!(store.round_trips(), before);
    assert!(session.identity_maps().of::<User>().is_acquired(&bob.id));

    session.commit().await.unwrap();
    assert_eq!(store.count(Collection::Users), 1);
}

#[tokio::test]
async fn racing_role_inserts_report_the_duplicate_role() {
    let store = InMemoryDocumentStore::new();
    let movie_id = MovieId::new();
    let draft = RoleDraft {
        person_id: PersonId::new(),
        character: "Ripley".into(),
        is_main: true,
    };

    let mut first = Session::begin(&store, locks()).await.unwrap();
    let mut second = Session::begin(&store, locks()).await.unwrap();
    first.roles().save(draft.clone().into_role(movie_id)).unwrap();
    second.roles().save(draft.into_role(movie_id)).unwrap();

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyExists { kind: "role" }));
    assert_eq!(store.count(Collection::Roles), 1);
}
