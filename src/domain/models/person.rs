use serde::{Deserialize, Serialize};

/// Sentinel for "not attending any lesson right now".
pub const NO_LESSON: i32 = -1;

/// Domain model for a person registered at the training center.
///
/// The same type covers teachers and students; a lesson decides which role a
/// person plays. Other entities never hold a `Person` directly — they refer
/// to it by `id` and resolve it through the [`PersonStore`].
///
/// Invariant: `during_lesson == true` exactly when `current_lesson_id` names
/// a currently started lesson this person takes part in.
///
/// [`PersonStore`]: crate::domain::person_store::PersonStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    id: i32,
    first_name: String,
    last_name: String,
    during_lesson: bool,
    current_lesson_id: i32,
    future_lessons: Vec<i32>,
}

impl Person {
    /// Create a person that is not attending anything yet.
    pub fn new(id: i32, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::from_parts(id, first_name, last_name, false, NO_LESSON)
    }

    /// Rebuild a person from persisted fields.
    pub fn from_parts(
        id: i32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        during_lesson: bool,
        current_lesson_id: i32,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            during_lesson,
            current_lesson_id,
            future_lessons: Vec::new(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn is_during_lesson(&self) -> bool {
        self.during_lesson
    }

    pub fn current_lesson_id(&self) -> i32 {
        self.current_lesson_id
    }

    /// Ordered ids of lessons this person is scheduled for but which have
    /// not started yet.
    pub fn future_lessons(&self) -> &[i32] {
        &self.future_lessons
    }

    pub fn set_during_lesson(&mut self, during_lesson: bool) {
        self.during_lesson = during_lesson;
    }

    /// Point the person at a started lesson. Rejects negative ids; clearing
    /// goes through [`clear_current_lesson`](Self::clear_current_lesson)
    /// instead.
    pub fn set_current_lesson(&mut self, lesson_id: i32) -> bool {
        if lesson_id < 0 {
            return false;
        }
        self.current_lesson_id = lesson_id;
        true
    }

    /// Reset the occupancy state after a lesson ends.
    pub fn clear_current_lesson(&mut self) {
        self.during_lesson = false;
        self.current_lesson_id = NO_LESSON;
    }

    pub fn add_future_lesson(&mut self, lesson_id: i32) {
        self.future_lessons.push(lesson_id);
    }

    /// Drop a lesson from the future schedule. Removing an id that is not
    /// present is a silent no-op.
    pub fn remove_future_lesson(&mut self, lesson_id: i32) {
        self.future_lessons.retain(|&id| id != lesson_id);
    }

    /// One-line human readable summary.
    pub fn describe(&self) -> String {
        let mut info = format!(
            "ID: {}, First name: {}, Last name: {}, During lesson: {}",
            self.id, self.first_name, self.last_name, self.during_lesson
        );
        if self.during_lesson {
            info.push_str(&format!(", Lesson ID: {}", self.current_lesson_id));
        }
        info
    }
}
