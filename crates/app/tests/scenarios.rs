use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;

use curator_app::{
    AcceptContribution, AppError, CreateUser, Curator, GrantPermissions, RejectContribution, SubmitAddMovie,
    SubmitAddPerson, SubmitEditMovie,
};
use curator_auth::{InMemoryPermissionCache, Permissions};
use curator_core::{Maybe, MovieId, PersonId, UserId};
use curator_domain::{
    Achievement, ContributionKind, ContributionStatus, Genre, Milestone, MovieChanges, MovieListEdits, NewMovie,
    NewPerson, Person, RoleDraft, User, WriterDraft, Writing,
};
use curator_events::{DomainEvent, EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use curator_persistence::{Collection, ConstantLockFactory, Document, InMemoryDocumentStore, Session, UserField};

struct Harness {
    curator: Curator,
    store: Arc<InMemoryDocumentStore>,
    events: Subscription<EventEnvelope<DomainEvent>>,
    admin: UserId,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let bus: Arc<InMemoryEventBus<EventEnvelope<DomainEvent>>> = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe();

        let curator = Curator::new(
            store.clone(),
            Arc::new(ConstantLockFactory::default()),
            Arc::new(InMemoryPermissionCache::new()),
            bus,
        );

        let admin = User::register(UserId::new(), "admin", "admin@example.com", Permissions::ADMIN, Utc::now()).unwrap();
        let harness = Self {
            curator,
            store,
            events,
            admin: admin.id,
        };
        harness.seed(|s| s.users().save(admin)).await;
        harness
    }

    /// Commit writes made directly through a session, bypassing the pipeline.
    async fn seed(&self, write: impl FnOnce(&mut Session) -> curator_persistence::PersistenceResult<()>) {
        let mut session = Session::begin(self.store.as_ref(), Arc::new(ConstantLockFactory::default()))
            .await
            .unwrap();
        write(&mut session).unwrap();
        session.commit().await.unwrap();
    }

    async fn register(&self, name: &str) -> User {
        let id = UserId::new();
        self.curator
            .execute(
                id,
                CreateUser {
                    id,
                    name: name.to_string(),
                    email: format!("{name}@example.com"),
                },
            )
            .await
            .unwrap()
    }

    async fn seed_person(&self, name: &str) -> Person {
        let person = Person::create(PersonId::new(), new_person(name), Utc::now()).unwrap();
        let saved = person.clone();
        self.seed(|s| s.persons().save(saved)).await;
        person
    }

    fn doc(&self, collection: Collection, id: impl ToString) -> Document {
        let id = id.to_string();
        self.store
            .documents(collection)
            .into_iter()
            .find(|d| d["id"] == json!(id))
            .unwrap()
    }

    fn snapshot(&self) -> Vec<Vec<Document>> {
        Collection::ALL.iter().map(|c| self.store.documents(*c)).collect()
    }
}

fn new_person(name: &str) -> NewPerson {
    NewPerson {
        name: name.to_string(),
        en_name: None,
        sex: None,
        birth_date: None,
        death_date: None,
        photo: None,
    }
}

fn new_movie(title: &str) -> NewMovie {
    NewMovie {
        eng_title: title.to_string(),
        original_title: None,
        release_date: NaiveDate::from_ymd_opt(1982, 6, 25).unwrap(),
        countries: vec!["US".into()],
        genres: vec![Genre::ScienceFiction],
        mpaa: None,
        duration_minutes: 117,
        budget: None,
        usa_gross: None,
        world_gross: None,
        summary: Some("Replicants return to Earth.".into()),
    }
}

fn role(person_id: PersonId, character: &str) -> RoleDraft {
    RoleDraft {
        person_id,
        character: character.to_string(),
        is_main: true,
    }
}

fn accept(kind: ContributionKind, contribution_id: curator_core::ContributionId) -> AcceptContribution {
    AcceptContribution { kind, contribution_id }
}

#[tokio::test]
async fn scenario_a_second_user_with_a_taken_name_fails() {
    let h = Harness::new().await;
    h.register("alice").await;

    let u2 = UserId::new();
    let err = h
        .curator
        .execute(
            u2,
            CreateUser {
                id: u2,
                name: "alice".into(),
                email: "other@example.com".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AlreadyTaken(UserField::Name)));
    assert_eq!(h.store.count(Collection::Users), 2);
}

#[tokio::test]
async fn scenario_b_missing_person_blocks_acceptance_and_writes_nothing() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let p1 = h.seed_person("Harrison Ford").await;
    let p2 = PersonId::new();

    let submitted = h
        .curator
        .execute(
            author.id,
            SubmitAddMovie {
                movie: new_movie("Blade Runner"),
                roles: vec![role(p1.id, "Deckard"), role(p2, "Batty")],
                writers: vec![],
                crew: vec![],
                photos: vec![],
            },
        )
        .await
        .unwrap();

    let before = h.snapshot();
    let err = h
        .curator
        .execute(h.admin, accept(ContributionKind::AddMovie, submitted.contribution_id))
        .await
        .unwrap_err();

    match err {
        AppError::ReferentialGap { kind, missing } => {
            assert_eq!(kind, "person");
            assert_eq!(missing, vec![p2.to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.snapshot(), before);
    assert_eq!(h.store.count(Collection::Movies), 0);
    assert_eq!(h.store.count(Collection::Roles), 0);
    assert_eq!(
        h.doc(Collection::AddMovieContributions, submitted.contribution_id)["status"],
        json!("pending")
    );
}

#[tokio::test]
async fn scenario_c_tenth_acceptance_unlocks_one_achievement_and_one_event() {
    let h = Harness::new().await;
    let mut author = User::register(UserId::new(), "veteran", "veteran@example.com", Permissions::CONTRIBUTOR, Utc::now())
        .unwrap();
    author.accepted_contributions = 9;
    let seeded = author.clone();
    h.seed(|s| s.users().save(seeded)).await;

    let submitted = h
        .curator
        .execute(author.id, SubmitAddPerson { person: new_person("Rutger Hauer") })
        .await
        .unwrap();
    let moderated = h
        .curator
        .execute(h.admin, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await
        .unwrap();

    let achievement_id = moderated.achievement_id.unwrap();
    let stored = h.doc(Collection::Achievements, achievement_id);
    assert_eq!(stored["achieved"], json!("accepted_10"));
    assert_eq!(stored["user_id"], json!(author.id.to_string()));
    assert_eq!(h.doc(Collection::Users, author.id)["accepted_contributions"], json!(10));
    assert_eq!(h.store.count(Collection::Persons), 1);

    let events = h.events.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type(), "achievement.unlocked");
    let DomainEvent::AchievementUnlocked(unlocked) = events[0].payload();
    assert_eq!(unlocked.achievement_id, achievement_id);
    assert_eq!(unlocked.achieved, Milestone::Accepted10);
}

#[tokio::test]
async fn a_milestone_is_never_unlocked_twice() {
    let h = Harness::new().await;
    let mut author = User::register(UserId::new(), "veteran", "veteran@example.com", Permissions::CONTRIBUTOR, Utc::now())
        .unwrap();
    author.accepted_contributions = 9;
    let earlier = Achievement::unlock(author.id, Milestone::Accepted10, Utc::now());
    let seeded = author.clone();
    h.seed(move |s| {
        s.users().save(seeded)?;
        s.achievements().save(earlier)
    })
    .await;

    let submitted = h
        .curator
        .execute(author.id, SubmitAddPerson { person: new_person("Sean Young") })
        .await
        .unwrap();
    let moderated = h
        .curator
        .execute(h.admin, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await
        .unwrap();

    assert_eq!(moderated.achievement_id, None);
    assert_eq!(h.store.count(Collection::Achievements), 1);
    assert!(h.events.drain().is_empty());
}

#[tokio::test]
async fn unauthorized_moderation_changes_nothing() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let submitted = h
        .curator
        .execute(author.id, SubmitAddPerson { person: new_person("Daryl Hannah") })
        .await
        .unwrap();

    let before = h.snapshot();
    let err = h
        .curator
        .execute(author.id, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert_eq!(h.snapshot(), before);
}

#[tokio::test]
async fn granted_permissions_take_effect_on_the_next_request() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let moderator = h.register("moderator").await;
    let submitted = h
        .curator
        .execute(author.id, SubmitAddPerson { person: new_person("Edward James Olmos") })
        .await
        .unwrap();

    // The moderator's contributor bits are cached from registration.
    let denied = h
        .curator
        .execute(moderator.id, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    h.curator
        .execute(
            h.admin,
            GrantPermissions {
                user_id: moderator.id,
                permissions: Permissions::MODERATOR,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.curator.permission_cache().get(moderator.id), Some(Permissions::MODERATOR));

    let moderated = h
        .curator
        .execute(moderator.id, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await
        .unwrap();
    assert_eq!(moderated.status, ContributionStatus::Accepted);
}

#[tokio::test]
async fn a_contribution_is_moderated_once() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let submitted = h
        .curator
        .execute(author.id, SubmitAddPerson { person: new_person("Joanna Cassidy") })
        .await
        .unwrap();

    let rejected = h
        .curator
        .execute(
            h.admin,
            RejectContribution {
                kind: ContributionKind::AddPerson,
                contribution_id: submitted.contribution_id,
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, ContributionStatus::Rejected);
    assert!(rejected.achievement_id.is_some());

    let err = h
        .curator
        .execute(h.admin, accept(ContributionKind::AddPerson, submitted.contribution_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotPending(id) if id == submitted.contribution_id));

    let user = h.doc(Collection::Users, author.id);
    assert_eq!(user["rejected_contributions"], json!(1));
    assert_eq!(user["rating"], json!(-2));
    assert_eq!(h.store.count(Collection::Persons), 0);
}

#[tokio::test]
async fn accepted_movie_edits_apply_fields_and_credit_lists() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let ford = h.seed_person("Harrison Ford").await;
    let fancher = h.seed_person("Hampton Fancher").await;

    let added = h
        .curator
        .execute(
            author.id,
            SubmitAddMovie {
                movie: new_movie("Blade Runner"),
                roles: vec![role(ford.id, "Deckard")],
                writers: vec![],
                crew: vec![],
                photos: vec!["poster.jpg".into()],
            },
        )
        .await
        .unwrap();
    h.curator
        .execute(h.admin, accept(ContributionKind::AddMovie, added.contribution_id))
        .await
        .unwrap();

    let contribution = h.doc(Collection::AddMovieContributions, added.contribution_id);
    let movie_id: MovieId = serde_json::from_value(contribution["movie_id"].clone()).unwrap();
    let role_id = h.store.documents(Collection::Roles)[0]["id"].clone();

    let edit = h
        .curator
        .execute(
            author.id,
            SubmitEditMovie {
                movie_id,
                changes: MovieChanges {
                    summary: Maybe::Set(None),
                    duration_minutes: Maybe::Set(112),
                    ..MovieChanges::default()
                },
                lists: MovieListEdits {
                    roles_to_remove: vec![serde_json::from_value(role_id).unwrap()],
                    writers_to_add: vec![WriterDraft {
                        person_id: fancher.id,
                        writing: Writing::Screenplay,
                    }],
                    photos_to_remove: vec!["poster.jpg".into()],
                    ..MovieListEdits::default()
                },
            },
        )
        .await
        .unwrap();

    let pending = h.doc(Collection::EditMovieContributions, edit.contribution_id);
    assert_eq!(pending["summary"], json!(null));
    assert!(!pending.contains_key("eng_title"));

    h.curator
        .execute(h.admin, accept(ContributionKind::EditMovie, edit.contribution_id))
        .await
        .unwrap();

    let movie = h.doc(Collection::Movies, movie_id);
    assert_eq!(movie["summary"], json!(null));
    assert_eq!(movie["duration_minutes"], json!(112));
    assert_eq!(movie["eng_title"], json!("Blade Runner"));
    assert_eq!(movie["photos"], json!([]));
    assert_eq!(movie["lock"], json!("locked"));
    assert_eq!(h.store.count(Collection::Roles), 0);
    assert_eq!(h.store.documents(Collection::Writers)[0]["writing"], json!("screenplay"));
    assert_eq!(h.doc(Collection::Users, author.id)["accepted_contributions"], json!(2));
}

#[tokio::test]
async fn an_edit_can_replace_a_role_with_the_same_character() {
    let h = Harness::new().await;
    let author = h.register("author").await;
    let ford = h.seed_person("Harrison Ford").await;

    let added = h
        .curator
        .execute(
            author.id,
            SubmitAddMovie {
                movie: new_movie("Blade Runner"),
                roles: vec![RoleDraft {
                    is_main: false,
                    ..role(ford.id, "Deckard")
                }],
                writers: vec![],
                crew: vec![],
                photos: vec![],
            },
        )
        .await
        .unwrap();
    h.curator
        .execute(h.admin, accept(ContributionKind::AddMovie, added.contribution_id))
        .await
        .unwrap();

    let contribution = h.doc(Collection::AddMovieContributions, added.contribution_id);
    let movie_id: MovieId = serde_json::from_value(contribution["movie_id"].clone()).unwrap();
    let old_role = h.store.documents(Collection::Roles)[0]["id"].clone();

    let edit = h
        .curator
        .execute(
            author.id,
            SubmitEditMovie {
                movie_id,
                changes: MovieChanges::default(),
                lists: MovieListEdits {
                    roles_to_remove: vec![serde_json::from_value(old_role.clone()).unwrap()],
                    roles_to_add: vec![role(ford.id, "Deckard")],
                    ..MovieListEdits::default()
                },
            },
        )
        .await
        .unwrap();
    h.curator
        .execute(h.admin, accept(ContributionKind::EditMovie, edit.contribution_id))
        .await
        .unwrap();

    let roles = h.store.documents(Collection::Roles);
    assert_eq!(roles.len(), 1);
    assert_ne!(roles[0]["id"], old_role);
    assert_eq!(roles[0]["character"], json!("Deckard"));
    assert_eq!(roles[0]["is_main"], json!(true));
}
