//! Domain layer: entity models, in-memory stores and the services that
//! orchestrate them.

pub mod classroom_service;
pub mod classroom_store;
pub mod commands;
pub mod lesson_repository;
pub mod lesson_service;
pub mod models;
pub mod person_service;
pub mod person_store;

pub use classroom_service::ClassRoomService;
pub use classroom_store::{ClassRoomStore, SharedClassRoomStore};
pub use lesson_repository::{LessonIdSequence, LessonRepository, SharedLessonRepository};
pub use lesson_service::LessonService;
pub use models::classroom::{ClassRoom, ClassRoomType};
pub use models::lesson::{Lesson, LessonError, LessonKind};
pub use models::person::Person;
pub use person_service::PersonService;
pub use person_store::{PersonStore, SharedPersonStore};
