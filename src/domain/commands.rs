//! Domain-level command types.
//!
//! These structs carry the caller's input into the services. They are plain
//! data; all validation happens inside the service that consumes them.

pub mod lessons {
    use chrono::{DateTime, Utc};

    /// Input for creating an individual (one student) lesson.
    #[derive(Debug, Clone)]
    pub struct CreateIndividualLessonCommand {
        pub teacher_id: i32,
        pub student_id: i32,
        pub begin_time: DateTime<Utc>,
        pub end_time: DateTime<Utc>,
        pub base_cost: i64,
        pub subject: String,
        pub classroom_number: i32,
        /// When true the lesson starts immediately instead of being planned.
        pub start_now: bool,
    }

    /// Input for creating a group lesson. The roster starts empty and is
    /// filled afterwards through `add_student_to_group_lesson`.
    #[derive(Debug, Clone)]
    pub struct CreateGroupLessonCommand {
        pub teacher_id: i32,
        pub begin_time: DateTime<Utc>,
        pub end_time: DateTime<Utc>,
        pub base_cost: i64,
        pub subject: String,
        pub classroom_number: i32,
        pub start_now: bool,
    }
}
