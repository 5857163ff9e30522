//! Training-center backend.
//!
//! A console-driven administration backend for a small training center:
//! people, classrooms with per-subject rent pricing, and lessons that move
//! through a planned → started → finished lifecycle with cost calculation
//! at the end. State lives in shared in-memory stores; persistence is
//! CSV files with append-only archives for removed records.
//!
//! The [`Backend`] struct wires everything together; frontends call its
//! services and drive lifecycle transitions on their own cadence (there is
//! no background scheduler).

pub mod domain;
pub mod storage;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use domain::classroom_store::ClassRoomStore;
use domain::lesson_repository::{LessonIdSequence, LessonRepository};
use domain::person_store::PersonStore;
use domain::{ClassRoomService, LessonService, PersonService};
use storage::csv::{
    ClassRoomFileStorage, CsvConnection, LessonFileStorage, PersonFileStorage,
};

/// The assembled backend: one service per entity category over shared
/// stores and a common data directory.
#[derive(Clone)]
pub struct Backend {
    pub person_service: PersonService,
    pub classroom_service: ClassRoomService,
    pub lesson_service: LessonService,
}

impl Backend {
    /// Build the backend over the given data directory.
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Result<Self> {
        Self::with_connection(CsvConnection::new(data_directory)?)
    }

    /// Build the backend over the default per-user data directory.
    pub fn new_default() -> Result<Self> {
        Self::with_connection(CsvConnection::new_default()?)
    }

    fn with_connection(connection: CsvConnection) -> Result<Self> {
        let persons = PersonStore::shared();
        let classrooms = ClassRoomStore::shared();
        let lessons = LessonRepository::shared();
        let id_sequence = Arc::new(LessonIdSequence::new());

        let person_service = PersonService::new(
            persons.clone(),
            PersonFileStorage::new(connection.clone()),
        );
        let classroom_service = ClassRoomService::new(
            classrooms.clone(),
            ClassRoomFileStorage::new(connection.clone()),
        );
        let lesson_service = LessonService::new(
            lessons,
            persons,
            classrooms,
            LessonFileStorage::new(connection),
            id_sequence,
        );

        Ok(Self {
            person_service,
            classroom_service,
            lesson_service,
        })
    }

    /// Persist every working set.
    pub fn save_all(&self) -> Result<()> {
        self.person_service.save()?;
        self.classroom_service.save()?;
        self.lesson_service.save()?;
        Ok(())
    }

    /// Load every working set from disk. Meant to run once at startup.
    pub fn load_all(&self) -> Result<()> {
        self.person_service.load()?;
        self.classroom_service.load()?;
        self.lesson_service.load()?;
        Ok(())
    }
}
