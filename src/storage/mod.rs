//! Persistence layer: storage traits plus the CSV implementation.

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::{ClassRoomStorage, LessonStorage, PersonStorage};
