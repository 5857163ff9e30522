use std::sync::{Arc, Mutex};

use crate::domain::models::person::Person;

/// In-memory working set of people, keyed by id and kept in insertion order.
///
/// This is the arena every other part of the system resolves person ids
/// against; lessons and the engine never own a `Person`.
#[derive(Debug, Default)]
pub struct PersonStore {
    persons: Vec<Person>,
}

/// A person store shared between services behind a single writer lock.
pub type SharedPersonStore = Arc<Mutex<PersonStore>>;

impl PersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPersonStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Add a person. Returns `false` (and leaves the store unchanged) when
    /// the id is already taken.
    pub fn add(&mut self, person: Person) -> bool {
        if self.find_by_id(person.id()).is_some() {
            return false;
        }
        self.persons.push(person);
        true
    }

    pub fn remove_by_id(&mut self, id: i32) -> Option<Person> {
        let index = self.persons.iter().position(|p| p.id() == id)?;
        Some(self.persons.remove(index))
    }

    pub fn find_by_id(&self, id: i32) -> Option<&Person> {
        self.persons.iter().find(|p| p.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: i32) -> Option<&mut Person> {
        self.persons.iter_mut().find(|p| p.id() == id)
    }

    pub fn find_by<P>(&self, predicate: P) -> Vec<Person>
    where
        P: Fn(&Person) -> bool,
    {
        self.persons
            .iter()
            .filter(|p| predicate(p))
            .cloned()
            .collect()
    }

    pub fn find_all(&self) -> Vec<Person> {
        self.persons.clone()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Person> {
        self.persons.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
