use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminated failures of the lesson engine.
///
/// Every variant is a recoverable precondition violation; operations check
/// these before touching any shared state, so a rejected call leaves people,
/// classrooms and lessons unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LessonError {
    #[error("lesson {0} not found")]
    LessonNotFound(i32),
    #[error("person {0} not found")]
    UnknownPerson(i32),
    #[error("classroom {0} not found")]
    UnknownClassRoom(i32),
    #[error("lesson {0} is not a group lesson")]
    NotGroupLesson(i32),
    #[error("person {person_id} is not taking part in a lesson right now")]
    NotParticipant { person_id: i32 },
    #[error("person {person_id} is not assigned to lesson {lesson_id}")]
    NotAssignedToLesson { person_id: i32, lesson_id: i32 },
}

/// The two lesson flavours. References are plain person ids resolved through
/// the person store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LessonKind {
    Individual { student_id: i32 },
    Group { student_ids: Vec<i32> },
}

/// Domain model for a lesson.
///
/// The id is assigned once at construction and never changes. `end_time`
/// holds the scheduled end while the lesson is live; finishing overwrites it
/// with the actual end, or clears it entirely when the clock produced a
/// degenerate window (end not after begin). `total_cost` stays at `-1` until
/// the lesson finishes with a valid window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    id: i32,
    teacher_id: i32,
    begin_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    base_cost: i64,
    subject: String,
    classroom_number: i32,
    started: bool,
    total_cost: i64,
    kind: LessonKind,
}

impl Lesson {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i32,
        teacher_id: i32,
        begin_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        base_cost: i64,
        subject: impl Into<String>,
        classroom_number: i32,
        kind: LessonKind,
        started: bool,
    ) -> Self {
        Self {
            id,
            teacher_id,
            begin_time,
            end_time: Some(end_time),
            base_cost,
            subject: subject.into(),
            classroom_number,
            started,
            total_cost: -1,
            kind,
        }
    }

    /// Rebuild a lesson from persisted fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: i32,
        teacher_id: i32,
        begin_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        base_cost: i64,
        subject: impl Into<String>,
        classroom_number: i32,
        started: bool,
        total_cost: i64,
        kind: LessonKind,
    ) -> Self {
        Self {
            id,
            teacher_id,
            begin_time,
            end_time,
            base_cost,
            subject: subject.into(),
            classroom_number,
            started,
            total_cost,
            kind,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn teacher_id(&self) -> i32 {
        self.teacher_id
    }

    pub fn begin_time(&self) -> DateTime<Utc> {
        self.begin_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn base_cost(&self) -> i64 {
        self.base_cost
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn classroom_number(&self) -> i32 {
        self.classroom_number
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_started(&mut self, started: bool) {
        self.started = started;
    }

    /// `-1` until the lesson has finished with a valid time window.
    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    pub fn kind(&self) -> &LessonKind {
        &self.kind
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LessonKind::Group { .. })
    }

    /// Student ids in roster order. An individual lesson yields its single
    /// student.
    pub fn student_ids(&self) -> Vec<i32> {
        match &self.kind {
            LessonKind::Individual { student_id } => vec![*student_id],
            LessonKind::Group { student_ids } => student_ids.clone(),
        }
    }

    /// Teacher first, then the students.
    pub fn participant_ids(&self) -> Vec<i32> {
        let mut ids = vec![self.teacher_id];
        ids.extend(self.student_ids());
        ids
    }

    /// Append a student to a group roster. The caller resolves the person
    /// beforehand; duplicates are not rejected here.
    pub fn add_student(&mut self, person_id: i32) -> Result<(), LessonError> {
        match &mut self.kind {
            LessonKind::Group { student_ids } => {
                student_ids.push(person_id);
                Ok(())
            }
            LessonKind::Individual { .. } => Err(LessonError::NotGroupLesson(self.id)),
        }
    }

    /// Drop a student from a group roster. Removing an id that is not in the
    /// roster is a silent no-op.
    pub fn remove_student(&mut self, person_id: i32) -> Result<(), LessonError> {
        match &mut self.kind {
            LessonKind::Group { student_ids } => {
                student_ids.retain(|&id| id != person_id);
                Ok(())
            }
            LessonKind::Individual { .. } => Err(LessonError::NotGroupLesson(self.id)),
        }
    }

    /// Close the lesson at `now`.
    ///
    /// A window where `now` is not after the begin time is tolerated: the end
    /// time is cleared again and the total cost stays at `-1`, but the lesson
    /// still counts as finished. Otherwise the total cost is computed from
    /// the duration and the classroom's actual rent.
    pub fn finish_at(&mut self, now: DateTime<Utc>, actual_rent: f64) {
        self.end_time = Some(now);
        if now <= self.begin_time {
            self.end_time = None;
            return;
        }
        self.total_cost = self.calculate_total_cost(actual_rent);
    }

    /// Total cost of the lesson given the classroom's actual rent.
    ///
    /// Returns `-1` for an unset or degenerate window and `0` for sub-minute
    /// lessons (a deliberate floor). Otherwise the duration is billed in
    /// whole minutes rounded up, plus the rent truncated toward zero.
    pub fn calculate_total_cost(&self, actual_rent: f64) -> i64 {
        let end = match self.end_time {
            Some(end) if self.begin_time < end => end,
            _ => return -1,
        };

        let seconds = (end - self.begin_time).num_seconds();
        if seconds < 60 {
            return 0;
        }

        let minutes = (seconds + 59) / 60;
        minutes * self.base_cost + actual_rent as i64
    }

    /// Multi-line human readable summary. Participant names are resolved by
    /// the caller; this lists the ids the lesson holds.
    pub fn describe(&self) -> String {
        let end = self
            .end_time
            .map(|end| end.to_rfc3339())
            .unwrap_or_else(|| "unset".to_string());
        let mut info = format!(
            "Lesson no {}: {}\n  begins: {}, ends: {}\n  classroom: {}, teacher: {}",
            self.id,
            self.subject,
            self.begin_time.to_rfc3339(),
            end,
            self.classroom_number,
            self.teacher_id,
        );
        match &self.kind {
            LessonKind::Individual { student_id } => {
                info.push_str(&format!("\n  student: {}", student_id));
            }
            LessonKind::Group { student_ids } => {
                let roster = student_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                info.push_str(&format!("\n  students: [{}]", roster));
            }
        }
        info
    }
}
