use anyhow::Result;
use log::{error, info};

use crate::domain::classroom_store::SharedClassRoomStore;
use crate::domain::models::classroom::ClassRoom;
use crate::storage::csv::ClassRoomFileStorage;
use crate::storage::traits::ClassRoomStorage;

/// Classroom inventory management: registration, removal with archiving,
/// queries and persistence.
#[derive(Clone)]
pub struct ClassRoomService {
    classrooms: SharedClassRoomStore,
    storage: ClassRoomFileStorage,
}

impl ClassRoomService {
    pub fn new(classrooms: SharedClassRoomStore, storage: ClassRoomFileStorage) -> Self {
        Self {
            classrooms,
            storage,
        }
    }

    /// Register a classroom. Adding a number that is already taken is a
    /// no-op and returns the entity already in the store.
    pub fn add_classroom(&self, classroom: ClassRoom) -> ClassRoom {
        let mut classrooms = self.classrooms.lock().unwrap();
        if let Some(existing) = classrooms.find_by_number(classroom.number()) {
            info!(
                "Classroom {} already registered, keeping the existing entry",
                classroom.number()
            );
            return existing.clone();
        }
        let number = classroom.number();
        classrooms.add(classroom.clone());
        info!("Registered classroom {}", number);
        classroom
    }

    /// Archive and remove a classroom. Returns the removed entity, or
    /// `None` when the number is unknown. Archive failures are logged,
    /// never fatal.
    pub fn remove_classroom(&self, number: i32) -> Option<ClassRoom> {
        let classroom = self
            .classrooms
            .lock()
            .unwrap()
            .find_by_number(number)
            .cloned()?;

        if let Err(e) = self.storage.append_archive(&classroom) {
            error!("Failed to archive classroom {}: {:#}", number, e);
        }
        let removed = self.classrooms.lock().unwrap().remove_by_number(number);

        info!("Removed classroom {}", number);
        removed
    }

    pub fn get_classroom(&self, number: i32) -> Option<ClassRoom> {
        self.classrooms
            .lock()
            .unwrap()
            .find_by_number(number)
            .cloned()
    }

    pub fn find_classrooms<P>(&self, predicate: P) -> Vec<ClassRoom>
    where
        P: Fn(&ClassRoom) -> bool,
    {
        self.classrooms.lock().unwrap().find_by(predicate)
    }

    pub fn find_all_classrooms(&self) -> Vec<ClassRoom> {
        self.classrooms.lock().unwrap().find_all()
    }

    pub fn find_available_classrooms(&self) -> Vec<ClassRoom> {
        self.find_classrooms(ClassRoom::is_available)
    }

    /// Numbered listing of the inventory.
    pub fn report(&self) -> String {
        let mut report = String::new();
        for (index, classroom) in self.find_all_classrooms().iter().enumerate() {
            report.push_str(&format!("{}. {}\n", index + 1, classroom.describe()));
        }
        report
    }

    pub fn save(&self) -> Result<()> {
        let classrooms = self.find_all_classrooms();
        self.storage.save_snapshot(&classrooms)?;
        info!("Saved {} classrooms", classrooms.len());
        Ok(())
    }

    /// Load the persisted inventory into the store. Records whose number is
    /// already present are skipped. Returns the number of classrooms added.
    pub fn load(&self) -> Result<usize> {
        let loaded = self.storage.load()?;
        let mut classrooms = self.classrooms.lock().unwrap();
        let mut added = 0;
        for classroom in loaded {
            if classrooms.add(classroom) {
                added += 1;
            }
        }
        info!("Loaded {} classrooms", added);
        Ok(added)
    }

    pub fn archived_classrooms(&self) -> Result<Vec<ClassRoom>> {
        self.storage.load_archive()
    }
}
