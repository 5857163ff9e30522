//! # CSV Storage Module
//!
//! File-based persistence for the training center. Each entity category
//! lives in its own delimited text file under the data directory, with a
//! matching append-only file under `archive/` for soft-deleted records.
//!
//! ## File format
//!
//! ```csv
//! kind,id,teacher_id,classroom,base_cost,subject,begin,end,started,total_cost,students
//! INDIVIDUAL,1,100,1,100,Algorithms,2024-03-01T10:00:00+00:00,,true,-1,200
//! GROUP,2,101,3,50,English B2,2024-03-01T12:00:00+00:00,2024-03-01T13:00:00+00:00,false,-1,201;202
//! ```
//!
//! Malformed records are logged and skipped on load; snapshots are written
//! atomically through a temp file.

pub mod classroom_storage;
pub mod connection;
pub mod lesson_storage;
pub mod person_storage;

pub use classroom_storage::ClassRoomFileStorage;
pub use connection::CsvConnection;
pub use lesson_storage::LessonFileStorage;
pub use person_storage::PersonFileStorage;
