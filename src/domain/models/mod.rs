//! Domain models for the training center: people, classrooms with their
//! pricing strategies, and lessons.

pub mod classroom;
pub mod lesson;
pub mod person;

pub use classroom::{ClassRoom, ClassRoomType};
pub use lesson::{Lesson, LessonError, LessonKind};
pub use person::{Person, NO_LESSON};
