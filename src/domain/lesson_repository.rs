use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::models::lesson::Lesson;

/// Monotonic source of lesson ids.
///
/// Created once at backend startup and handed to the lesson service; after a
/// load it is advanced past the highest persisted id so restored and new
/// lessons never collide.
#[derive(Debug, Default)]
pub struct LessonIdSequence {
    last: AtomicI32,
}

impl LessonIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused id. Ids start at 1.
    pub fn next(&self) -> i32 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make sure future ids are greater than `id`.
    pub fn advance_past(&self, id: i32) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }
}

/// Active working set of lessons: two insertion-ordered collections, one for
/// started lessons and one for planned ones. A lesson lives in exactly one
/// of them, matching its `started` flag.
#[derive(Debug, Default)]
pub struct LessonRepository {
    started: Vec<Lesson>,
    planned: Vec<Lesson>,
}

/// A lesson repository shared behind a single writer lock.
pub type SharedLessonRepository = Arc<Mutex<LessonRepository>>;

impl LessonRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLessonRepository {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn add(&mut self, lesson: Lesson, now: bool) {
        if now {
            self.started.push(lesson);
        } else {
            self.planned.push(lesson);
        }
    }

    pub fn find_by_id(&self, id: i32) -> Option<&Lesson> {
        self.started
            .iter()
            .chain(self.planned.iter())
            .find(|l| l.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: i32) -> Option<&mut Lesson> {
        self.started
            .iter_mut()
            .chain(self.planned.iter_mut())
            .find(|l| l.id() == id)
    }

    /// Matching lessons, started collection first, insertion order within
    /// each.
    pub fn find_by<P>(&self, predicate: P) -> Vec<Lesson>
    where
        P: Fn(&Lesson) -> bool,
    {
        self.started
            .iter()
            .chain(self.planned.iter())
            .filter(|l| predicate(l))
            .cloned()
            .collect()
    }

    pub fn find_all(&self) -> Vec<Lesson> {
        self.find_by(|_| true)
    }

    pub fn started(&self) -> Vec<Lesson> {
        self.started.clone()
    }

    pub fn planned(&self) -> Vec<Lesson> {
        self.planned.clone()
    }

    /// Move a planned lesson into the started collection. Returns `false`
    /// when the id is not in the planned collection.
    pub fn promote(&mut self, id: i32) -> bool {
        let Some(index) = self.planned.iter().position(|l| l.id() == id) else {
            return false;
        };
        let lesson = self.planned.remove(index);
        self.started.push(lesson);
        true
    }

    pub fn remove_by_id(&mut self, id: i32) -> Option<Lesson> {
        if let Some(index) = self.started.iter().position(|l| l.id() == id) {
            return Some(self.started.remove(index));
        }
        if let Some(index) = self.planned.iter().position(|l| l.id() == id) {
            return Some(self.planned.remove(index));
        }
        None
    }

    pub fn len(&self) -> usize {
        self.started.len() + self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.planned.is_empty()
    }
}
