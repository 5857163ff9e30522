//! # Storage Traits
//!
//! Abstractions over the persistence backend so the domain layer never
//! depends on how entities are written to disk. The working sets live in
//! memory; these traits cover the explicit save/load points and the
//! append-only archive of soft-deleted records.

use anyhow::Result;

use crate::domain::models::classroom::ClassRoom;
use crate::domain::models::lesson::Lesson;
use crate::domain::models::person::Person;

/// Persistence for the person working set.
pub trait PersonStorage: Send + Sync {
    /// Replace the persisted snapshot with the given working set.
    fn save_snapshot(&self, persons: &[Person]) -> Result<()>;

    /// Load the persisted working set. A missing file loads as empty.
    fn load(&self) -> Result<Vec<Person>>;

    /// Append a removed person to the archive.
    fn append_archive(&self, person: &Person) -> Result<()>;

    /// All archived people, oldest first.
    fn load_archive(&self) -> Result<Vec<Person>>;
}

/// Persistence for the classroom working set.
pub trait ClassRoomStorage: Send + Sync {
    fn save_snapshot(&self, rooms: &[ClassRoom]) -> Result<()>;

    fn load(&self) -> Result<Vec<ClassRoom>>;

    fn append_archive(&self, room: &ClassRoom) -> Result<()>;

    fn load_archive(&self) -> Result<Vec<ClassRoom>>;
}

/// Persistence for the lesson working set.
pub trait LessonStorage: Send + Sync {
    fn save_snapshot(&self, lessons: &[Lesson]) -> Result<()>;

    fn load(&self) -> Result<Vec<Lesson>>;

    /// Append a finished or removed lesson to the archive.
    fn append_archive(&self, lesson: &Lesson) -> Result<()>;

    fn load_archive(&self) -> Result<Vec<Lesson>>;
}
