//! Identity maps: one live instance per (entity type, id) per session.
//!
//! The map owns the tracked instance. Readers get clones; callers hand their
//! modified copy back through [`IdentityMap::update`], which replaces it.

use std::collections::{HashMap, HashSet};

use curator_domain::{
    Achievement, AddMovieContribution, AddPersonContribution, CrewMember, EditMovieContribution,
    EditPersonContribution, Movie, Person, Role, User, Writer,
};

use crate::error::{PersistenceError, PersistenceResult};
use crate::persistent::Persistent;

#[derive(Debug)]
pub struct IdentityMap<E: Persistent> {
    entries: HashMap<E::Id, E>,
    acquired: HashSet<E::Id>,
}

impl<E: Persistent> Default for IdentityMap<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            acquired: HashSet::new(),
        }
    }
}

impl<E: Persistent> IdentityMap<E> {
    pub fn by_id(&self, id: &E::Id) -> Option<&E> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.entries.contains_key(id)
    }

    /// Start tracking `entity`. Tracking the same id twice is a bug.
    pub fn save(&mut self, entity: E) -> PersistenceResult<()> {
        let id = *entity.id();
        if self.entries.contains_key(&id) {
            return Err(PersistenceError::consistency(format!(
                "{} {id} is already tracked in this session",
                E::KIND
            )));
        }
        self.entries.insert(id, entity);
        Ok(())
    }

    /// Replace the tracked instance.
    pub fn update(&mut self, entity: E) -> PersistenceResult<()> {
        let id = *entity.id();
        match self.entries.get_mut(&id) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(PersistenceError::consistency(format!(
                "{} {id} is not tracked in this session",
                E::KIND
            ))),
        }
    }

    pub fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.acquired.remove(id);
        self.entries.remove(id)
    }

    pub fn is_acquired(&self, id: &E::Id) -> bool {
        self.acquired.contains(id)
    }

    pub fn mark_acquired(&mut self, id: E::Id) {
        self.acquired.insert(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every identity map of a session.
#[derive(Debug, Default)]
pub struct IdentityMaps {
    pub(crate) users: IdentityMap<User>,
    pub(crate) movies: IdentityMap<Movie>,
    pub(crate) persons: IdentityMap<Person>,
    pub(crate) roles: IdentityMap<Role>,
    pub(crate) writers: IdentityMap<Writer>,
    pub(crate) crew_members: IdentityMap<CrewMember>,
    pub(crate) add_movie_contributions: IdentityMap<AddMovieContribution>,
    pub(crate) edit_movie_contributions: IdentityMap<EditMovieContribution>,
    pub(crate) add_person_contributions: IdentityMap<AddPersonContribution>,
    pub(crate) edit_person_contributions: IdentityMap<EditPersonContribution>,
    pub(crate) achievements: IdentityMap<Achievement>,
}

impl IdentityMaps {
    pub fn of<E: Persistent>(&self) -> &IdentityMap<E> {
        E::identity_map(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use curator_auth::Permissions;
    use curator_core::UserId;

    use super::*;

    fn user(name: &str) -> User {
        User::register(UserId::new(), name, format!("{name}@example.com"), Permissions::CONTRIBUTOR, Utc::now()).unwrap()
    }

    #[test]
    fn second_save_of_same_id_fails() {
        let mut map = IdentityMap::<User>::default();
        let alice = user("alice");
        map.save(alice.clone()).unwrap();

        let err = map.save(alice).unwrap_err();
        assert!(matches!(err, PersistenceError::ConsistencyViolation(_)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn update_replaces_and_requires_presence() {
        let mut map = IdentityMap::<User>::default();
        let mut alice = user("alice");
        assert!(map.update(alice.clone()).is_err());

        map.save(alice.clone()).unwrap();
        alice.rating = 42;
        map.update(alice.clone()).unwrap();
        assert_eq!(map.by_id(&alice.id).unwrap().rating, 42);
    }

    #[test]
    fn remove_forgets_acquisition() {
        let mut map = IdentityMap::<User>::default();
        let alice = user("alice");
        map.save(alice.clone()).unwrap();
        map.mark_acquired(alice.id);
        assert!(map.is_acquired(&alice.id));

        map.remove(&alice.id);
        assert!(!map.is_acquired(&alice.id));
        assert!(map.is_empty());
    }
}
