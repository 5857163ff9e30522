use anyhow::Result;
use log::{error, info};

use crate::domain::models::person::Person;
use crate::domain::person_store::SharedPersonStore;
use crate::storage::csv::PersonFileStorage;
use crate::storage::traits::PersonStorage;

/// Person roster management: registration, removal with archiving, queries
/// and persistence.
#[derive(Clone)]
pub struct PersonService {
    persons: SharedPersonStore,
    storage: PersonFileStorage,
}

impl PersonService {
    pub fn new(persons: SharedPersonStore, storage: PersonFileStorage) -> Self {
        Self { persons, storage }
    }

    /// Register a person. Adding an id that is already taken is a no-op and
    /// returns the entity already in the store.
    pub fn add_person(&self, person: Person) -> Person {
        let mut persons = self.persons.lock().unwrap();
        if let Some(existing) = persons.find_by_id(person.id()) {
            info!("Person {} already registered, keeping the existing entry", person.id());
            return existing.clone();
        }
        let id = person.id();
        persons.add(person.clone());
        info!("Registered person {}", id);
        person
    }

    /// Archive and remove a person. Returns the removed entity, or `None`
    /// when the id is unknown. Archive failures are logged, never fatal.
    pub fn remove_person(&self, id: i32) -> Option<Person> {
        let person = self.persons.lock().unwrap().find_by_id(id).cloned()?;

        if let Err(e) = self.storage.append_archive(&person) {
            error!("Failed to archive person {}: {:#}", id, e);
        }
        let removed = self.persons.lock().unwrap().remove_by_id(id);

        info!("Removed person {}", id);
        removed
    }

    pub fn get_person(&self, id: i32) -> Option<Person> {
        self.persons.lock().unwrap().find_by_id(id).cloned()
    }

    pub fn find_persons<P>(&self, predicate: P) -> Vec<Person>
    where
        P: Fn(&Person) -> bool,
    {
        self.persons.lock().unwrap().find_by(predicate)
    }

    pub fn find_all_persons(&self) -> Vec<Person> {
        self.persons.lock().unwrap().find_all()
    }

    /// Numbered listing of the roster.
    pub fn report(&self) -> String {
        let mut report = String::new();
        for (index, person) in self.find_all_persons().iter().enumerate() {
            report.push_str(&format!("{}. {}\n", index + 1, person.describe()));
        }
        report
    }

    pub fn save(&self) -> Result<()> {
        let persons = self.find_all_persons();
        self.storage.save_snapshot(&persons)?;
        info!("Saved {} persons", persons.len());
        Ok(())
    }

    /// Load the persisted roster into the store. Records whose id is
    /// already present are skipped. Returns the number of persons added.
    pub fn load(&self) -> Result<usize> {
        let loaded = self.storage.load()?;
        let mut persons = self.persons.lock().unwrap();
        let mut added = 0;
        for person in loaded {
            if persons.add(person) {
                added += 1;
            }
        }
        info!("Loaded {} persons", added);
        Ok(added)
    }

    pub fn archived_persons(&self) -> Result<Vec<Person>> {
        self.storage.load_archive()
    }
}
