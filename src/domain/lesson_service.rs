use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::Arc;

use crate::domain::classroom_store::SharedClassRoomStore;
use crate::domain::commands::lessons::{CreateGroupLessonCommand, CreateIndividualLessonCommand};
use crate::domain::lesson_repository::{LessonIdSequence, SharedLessonRepository};
use crate::domain::models::lesson::{Lesson, LessonError, LessonKind};
use crate::domain::person_store::SharedPersonStore;
use crate::storage::csv::LessonFileStorage;
use crate::storage::traits::LessonStorage;

/// The lesson engine.
///
/// Orchestrates the lesson lifecycle (planned → started → finished) and the
/// bookkeeping it implies on people (during-lesson flags, future schedules)
/// and classrooms (availability). All failable validation happens before any
/// shared state is touched, so a rejected operation leaves everything
/// unchanged.
///
/// Locks are never held across each other: every operation takes one store
/// lock at a time, relying on the single-threaded calling model for
/// transition atomicity.
#[derive(Clone)]
pub struct LessonService {
    lessons: SharedLessonRepository,
    persons: SharedPersonStore,
    classrooms: SharedClassRoomStore,
    storage: LessonFileStorage,
    id_sequence: Arc<LessonIdSequence>,
}

impl LessonService {
    pub fn new(
        lessons: SharedLessonRepository,
        persons: SharedPersonStore,
        classrooms: SharedClassRoomStore,
        storage: LessonFileStorage,
        id_sequence: Arc<LessonIdSequence>,
    ) -> Self {
        Self {
            lessons,
            persons,
            classrooms,
            storage,
            id_sequence,
        }
    }

    /// Create an individual lesson.
    ///
    /// The classroom is marked unavailable at creation regardless of
    /// `start_now` (observed behavior of the original system, kept until the
    /// product owner rules otherwise). A planned lesson lands on the future
    /// schedule of both participants; an immediately started one flags them
    /// as during-lesson right away.
    pub fn create_individual_lesson(
        &self,
        command: CreateIndividualLessonCommand,
    ) -> Result<Lesson, LessonError> {
        self.ensure_person_exists(command.teacher_id)?;
        self.ensure_person_exists(command.student_id)?;
        self.claim_classroom(command.classroom_number)?;

        let id = self.id_sequence.next();
        let lesson = Lesson::new(
            id,
            command.teacher_id,
            command.begin_time,
            command.end_time,
            command.base_cost,
            command.subject,
            command.classroom_number,
            LessonKind::Individual {
                student_id: command.student_id,
            },
            command.start_now,
        );

        self.lessons
            .lock()
            .unwrap()
            .add(lesson.clone(), command.start_now);
        self.register_participants(&lesson, command.start_now);

        info!(
            "Created individual lesson {} ({}), start_now={}",
            id,
            lesson.subject(),
            command.start_now
        );
        Ok(lesson)
    }

    /// Create a group lesson with an empty roster; students join later via
    /// [`add_student_to_group_lesson`](Self::add_student_to_group_lesson).
    pub fn create_group_lesson(
        &self,
        command: CreateGroupLessonCommand,
    ) -> Result<Lesson, LessonError> {
        self.ensure_person_exists(command.teacher_id)?;
        self.claim_classroom(command.classroom_number)?;

        let id = self.id_sequence.next();
        let lesson = Lesson::new(
            id,
            command.teacher_id,
            command.begin_time,
            command.end_time,
            command.base_cost,
            command.subject,
            command.classroom_number,
            LessonKind::Group {
                student_ids: Vec::new(),
            },
            command.start_now,
        );

        self.lessons
            .lock()
            .unwrap()
            .add(lesson.clone(), command.start_now);
        self.register_participants(&lesson, command.start_now);

        info!(
            "Created group lesson {} ({}), start_now={}",
            id,
            lesson.subject(),
            command.start_now
        );
        Ok(lesson)
    }

    /// Add a student to a group lesson roster.
    ///
    /// A planned lesson is also registered on the student's future schedule;
    /// joining an already started lesson flags the student as during-lesson
    /// immediately.
    pub fn add_student_to_group_lesson(
        &self,
        lesson_id: i32,
        person_id: i32,
    ) -> Result<(), LessonError> {
        let (is_group, is_started) = {
            let lessons = self.lessons.lock().unwrap();
            let lesson = lessons
                .find_by_id(lesson_id)
                .ok_or(LessonError::LessonNotFound(lesson_id))?;
            (lesson.is_group(), lesson.is_started())
        };
        if !is_group {
            return Err(LessonError::NotGroupLesson(lesson_id));
        }

        {
            let mut persons = self.persons.lock().unwrap();
            let person = persons
                .find_by_id_mut(person_id)
                .ok_or(LessonError::UnknownPerson(person_id))?;
            if is_started {
                person.set_during_lesson(true);
                person.set_current_lesson(lesson_id);
            } else {
                person.add_future_lesson(lesson_id);
            }
        }

        if let Some(lesson) = self.lessons.lock().unwrap().find_by_id_mut(lesson_id) {
            lesson.add_student(person_id)?;
        }

        info!("Added person {} to group lesson {}", person_id, lesson_id);
        Ok(())
    }

    /// Remove a student from a group lesson roster.
    ///
    /// Requires the student to be flagged during-lesson and assigned to this
    /// very lesson; both checks run before anything is mutated.
    pub fn remove_student_from_group_lesson(
        &self,
        lesson_id: i32,
        person_id: i32,
    ) -> Result<(), LessonError> {
        {
            let lessons = self.lessons.lock().unwrap();
            let lesson = lessons
                .find_by_id(lesson_id)
                .ok_or(LessonError::LessonNotFound(lesson_id))?;
            if !lesson.is_group() {
                return Err(LessonError::NotGroupLesson(lesson_id));
            }
        }

        {
            let mut persons = self.persons.lock().unwrap();
            let person = persons
                .find_by_id_mut(person_id)
                .ok_or(LessonError::UnknownPerson(person_id))?;
            if !person.is_during_lesson() {
                return Err(LessonError::NotParticipant { person_id });
            }
            if person.current_lesson_id() != lesson_id {
                return Err(LessonError::NotAssignedToLesson {
                    person_id,
                    lesson_id,
                });
            }
            person.clear_current_lesson();
        }

        if let Some(lesson) = self.lessons.lock().unwrap().find_by_id_mut(lesson_id) {
            lesson.remove_student(person_id)?;
        }

        info!(
            "Removed person {} from group lesson {}",
            person_id, lesson_id
        );
        Ok(())
    }

    /// Start a lesson: classroom becomes unavailable, every participant is
    /// flagged as during-lesson and loses the lesson from their future
    /// schedule, and the lesson moves into the started collection.
    ///
    /// Returns false when the lesson id is unknown.
    pub fn start_lesson(&self, id: i32) -> bool {
        let (classroom_number, participants) = {
            let mut lessons = self.lessons.lock().unwrap();
            let Some(lesson) = lessons.find_by_id_mut(id) else {
                warn!("Cannot start lesson {}: not found", id);
                return false;
            };
            lesson.set_started(true);
            let data = (lesson.classroom_number(), lesson.participant_ids());
            lessons.promote(id);
            data
        };

        if let Some(room) = self
            .classrooms
            .lock()
            .unwrap()
            .find_by_number_mut(classroom_number)
        {
            room.set_available(false);
        }

        {
            let mut persons = self.persons.lock().unwrap();
            for person_id in participants {
                if let Some(person) = persons.find_by_id_mut(person_id) {
                    person.remove_future_lesson(id);
                    person.set_during_lesson(true);
                    person.set_current_lesson(id);
                }
            }
        }

        info!("Started lesson {}", id);
        true
    }

    /// Finish a lesson now. See [`finish_lesson_at`](Self::finish_lesson_at).
    pub fn finish_lesson(&self, id: i32) -> bool {
        self.finish_lesson_at(id, Utc::now())
    }

    /// Finish a lesson at the given instant.
    ///
    /// Clears every person in the store whose current lesson id matches (a
    /// deliberately broad sweep, not limited to the roster), frees the
    /// classroom, closes the lesson (a degenerate window keeps the total
    /// cost at `-1`), archives it and removes it from the active set.
    ///
    /// Returns false when the lesson id is unknown; otherwise reports
    /// whether the removal from the active set succeeded. Archive failures
    /// are logged, never fatal.
    pub fn finish_lesson_at(&self, id: i32, now: DateTime<Utc>) -> bool {
        let classroom_number = {
            let lessons = self.lessons.lock().unwrap();
            let Some(lesson) = lessons.find_by_id(id) else {
                warn!("Cannot finish lesson {}: not found", id);
                return false;
            };
            lesson.classroom_number()
        };

        {
            let mut persons = self.persons.lock().unwrap();
            for person in persons.iter_mut() {
                if person.current_lesson_id() == id {
                    person.clear_current_lesson();
                }
            }
        }

        let actual_rent = {
            let mut classrooms = self.classrooms.lock().unwrap();
            match classrooms.find_by_number_mut(classroom_number) {
                Some(room) => {
                    room.set_available(true);
                    room.actual_rent_cost()
                }
                None => {
                    warn!(
                        "Classroom {} of lesson {} not found, billing rent as 0",
                        classroom_number, id
                    );
                    0.0
                }
            }
        };

        let finished = {
            let mut lessons = self.lessons.lock().unwrap();
            let Some(lesson) = lessons.find_by_id_mut(id) else {
                return false;
            };
            lesson.finish_at(now, actual_rent);
            lesson.clone()
        };

        if let Err(e) = self.storage.append_archive(&finished) {
            error!("Failed to archive lesson {}: {:#}", id, e);
        }

        let removed = self.lessons.lock().unwrap().remove_by_id(id).is_some();
        info!(
            "Finished lesson {}, total cost {}",
            id,
            finished.total_cost()
        );
        removed
    }

    /// Archive and remove a lesson without running the finish transition.
    /// Archive failures are logged and do not block the removal.
    pub fn remove_lesson(&self, id: i32) -> Result<(), LessonError> {
        let lesson = self
            .lessons
            .lock()
            .unwrap()
            .find_by_id(id)
            .cloned()
            .ok_or(LessonError::LessonNotFound(id))?;

        if let Err(e) = self.storage.append_archive(&lesson) {
            error!("Failed to archive lesson {}: {:#}", id, e);
        }
        self.lessons.lock().unwrap().remove_by_id(id);

        info!("Removed lesson {}", id);
        Ok(())
    }

    pub fn get_lesson(&self, id: i32) -> Option<Lesson> {
        self.lessons.lock().unwrap().find_by_id(id).cloned()
    }

    /// Matching lessons, started collection first.
    pub fn find_lessons<P>(&self, predicate: P) -> Vec<Lesson>
    where
        P: Fn(&Lesson) -> bool,
    {
        self.lessons.lock().unwrap().find_by(predicate)
    }

    pub fn find_all_lessons(&self) -> Vec<Lesson> {
        self.find_lessons(|_| true)
    }

    pub fn find_started_lessons(&self) -> Vec<Lesson> {
        self.lessons.lock().unwrap().started()
    }

    pub fn find_planned_lessons(&self) -> Vec<Lesson> {
        self.lessons.lock().unwrap().planned()
    }

    /// Numbered listing of every active lesson.
    pub fn report(&self) -> String {
        let mut report = String::new();
        for (index, lesson) in self.find_all_lessons().iter().enumerate() {
            report.push_str(&format!("{}. {}\n", index + 1, lesson.describe()));
        }
        report
    }

    /// Start every planned lesson whose begin time has passed. Invoked by
    /// the caller on its own cadence; there is no background scheduler.
    /// Returns the number of lessons started.
    pub fn start_due_lessons(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<i32> = self
            .find_lessons(|l| !l.is_started() && l.begin_time() < now)
            .iter()
            .map(Lesson::id)
            .collect();

        let mut started = 0;
        for id in due {
            if self.start_lesson(id) {
                started += 1;
            } else {
                warn!("Failed to start due lesson {}", id);
            }
        }
        started
    }

    /// Finish every started lesson whose scheduled end has passed. Returns
    /// the number of lessons finished.
    pub fn finish_due_lessons(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<i32> = self
            .find_lessons(|l| l.is_started() && l.end_time().is_some_and(|end| end < now))
            .iter()
            .map(Lesson::id)
            .collect();

        let mut finished = 0;
        for id in due {
            if self.finish_lesson_at(id, now) {
                finished += 1;
            } else {
                warn!("Failed to finish due lesson {}", id);
            }
        }
        finished
    }

    /// Persist the active working set.
    pub fn save(&self) -> Result<()> {
        let lessons = self.find_all_lessons();
        self.storage.save_snapshot(&lessons)?;
        info!("Saved {} lessons", lessons.len());
        Ok(())
    }

    /// Load the persisted working set into the repository and advance the
    /// id sequence past every loaded id. Meant to run once at startup.
    pub fn load(&self) -> Result<usize> {
        let lessons = self.storage.load()?;
        let count = lessons.len();

        let mut repo = self.lessons.lock().unwrap();
        for lesson in lessons {
            self.id_sequence.advance_past(lesson.id());
            let started = lesson.is_started();
            repo.add(lesson, started);
        }

        info!("Loaded {} lessons", count);
        Ok(count)
    }

    /// Every archived lesson, oldest first.
    pub fn archived_lessons(&self) -> Result<Vec<Lesson>> {
        self.storage.load_archive()
    }

    fn ensure_person_exists(&self, person_id: i32) -> Result<(), LessonError> {
        if self.persons.lock().unwrap().find_by_id(person_id).is_none() {
            return Err(LessonError::UnknownPerson(person_id));
        }
        Ok(())
    }

    /// Resolve the classroom and mark it unavailable.
    fn claim_classroom(&self, classroom_number: i32) -> Result<(), LessonError> {
        let mut classrooms = self.classrooms.lock().unwrap();
        let room = classrooms
            .find_by_number_mut(classroom_number)
            .ok_or(LessonError::UnknownClassRoom(classroom_number))?;
        room.set_available(false);
        Ok(())
    }

    /// Post-creation bookkeeping on the participants the lesson already
    /// knows about.
    fn register_participants(&self, lesson: &Lesson, start_now: bool) {
        let mut persons = self.persons.lock().unwrap();
        for person_id in lesson.participant_ids() {
            if let Some(person) = persons.find_by_id_mut(person_id) {
                if start_now {
                    person.set_during_lesson(true);
                    person.set_current_lesson(lesson.id());
                } else {
                    person.add_future_lesson(lesson.id());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classroom_store::ClassRoomStore;
    use crate::domain::lesson_repository::LessonRepository;
    use crate::domain::models::classroom::{ClassRoom, ClassRoomType};
    use crate::domain::models::person::{Person, NO_LESSON};
    use crate::domain::person_store::PersonStore;
    use crate::storage::csv::CsvConnection;
    use chrono::Duration;
    use tempfile::TempDir;

    const TEACHER: i32 = 100;
    const STUDENT: i32 = 200;
    const STUDENT_2: i32 = 201;
    const ROOM: i32 = 1;

    struct Fixture {
        service: LessonService,
        persons: SharedPersonStore,
        classrooms: SharedClassRoomStore,
        _temp_dir: TempDir,
    }

    fn setup() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();

        let persons = PersonStore::shared();
        {
            let mut store = persons.lock().unwrap();
            store.add(Person::new(TEACHER, "Jan", "Kowalski"));
            store.add(Person::new(STUDENT, "Kasia", "Iksinska"));
            store.add(Person::new(STUDENT_2, "Anna", "Nowak"));
        }

        let classrooms = ClassRoomStore::shared();
        {
            let mut store = classrooms.lock().unwrap();
            // actual rent: 1000 * 1.5 * 10 / 10 = 1500
            store.add(ClassRoom::new(
                ROOM,
                true,
                144,
                1000.0,
                ClassRoomType::It { computer_count: 10 },
            ));
        }

        let service = LessonService::new(
            LessonRepository::shared(),
            persons.clone(),
            classrooms.clone(),
            LessonFileStorage::new(connection),
            Arc::new(LessonIdSequence::new()),
        );

        Fixture {
            service,
            persons,
            classrooms,
            _temp_dir: temp_dir,
        }
    }

    fn individual_command(begin: DateTime<Utc>, start_now: bool) -> CreateIndividualLessonCommand {
        CreateIndividualLessonCommand {
            teacher_id: TEACHER,
            student_id: STUDENT,
            begin_time: begin,
            end_time: begin + Duration::minutes(45),
            base_cost: 100,
            subject: "Algorithms".to_string(),
            classroom_number: ROOM,
            start_now,
        }
    }

    fn group_command(begin: DateTime<Utc>, start_now: bool) -> CreateGroupLessonCommand {
        CreateGroupLessonCommand {
            teacher_id: TEACHER,
            begin_time: begin,
            end_time: begin + Duration::minutes(45),
            base_cost: 50,
            subject: "English B2".to_string(),
            classroom_number: ROOM,
            start_now,
        }
    }

    fn person(fixture: &Fixture, id: i32) -> Person {
        fixture
            .persons
            .lock()
            .unwrap()
            .find_by_id(id)
            .cloned()
            .unwrap()
    }

    fn room_available(fixture: &Fixture) -> bool {
        fixture
            .classrooms
            .lock()
            .unwrap()
            .find_by_number(ROOM)
            .unwrap()
            .is_available()
    }

    #[test]
    fn test_planned_creation_claims_classroom_and_future_schedules() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);

        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();

        // Classroom is claimed even though the lesson has not started.
        assert!(!room_available(&fixture));
        assert!(!lesson.is_started());
        assert_eq!(fixture.service.find_planned_lessons().len(), 1);
        assert!(fixture.service.find_started_lessons().is_empty());

        let teacher = person(&fixture, TEACHER);
        let student = person(&fixture, STUDENT);
        assert_eq!(teacher.future_lessons(), &[lesson.id()]);
        assert_eq!(student.future_lessons(), &[lesson.id()]);
        assert!(!teacher.is_during_lesson());
        assert!(!student.is_during_lesson());
    }

    #[test]
    fn test_immediate_creation_marks_participants_busy() {
        let fixture = setup();
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(Utc::now(), true))
            .unwrap();

        assert!(lesson.is_started());
        assert_eq!(fixture.service.find_started_lessons().len(), 1);
        assert!(fixture.service.find_planned_lessons().is_empty());

        let teacher = person(&fixture, TEACHER);
        assert!(teacher.is_during_lesson());
        assert_eq!(teacher.current_lesson_id(), lesson.id());
        assert!(teacher.future_lessons().is_empty());
    }

    #[test]
    fn test_creation_fails_on_unknown_references_without_side_effects() {
        let fixture = setup();
        let begin = Utc::now();

        let mut command = individual_command(begin, false);
        command.teacher_id = 999;
        assert_eq!(
            fixture.service.create_individual_lesson(command),
            Err(LessonError::UnknownPerson(999))
        );

        let mut command = individual_command(begin, false);
        command.classroom_number = 77;
        assert_eq!(
            fixture.service.create_individual_lesson(command),
            Err(LessonError::UnknownClassRoom(77))
        );

        // Nothing was created or claimed.
        assert!(fixture.service.find_all_lessons().is_empty());
        assert!(room_available(&fixture));
        assert!(person(&fixture, TEACHER).future_lessons().is_empty());
    }

    #[test]
    fn test_start_lesson_transition() {
        let fixture = setup();
        let begin = Utc::now() - Duration::minutes(1);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();

        assert!(fixture.service.start_lesson(lesson.id()));

        let started = fixture.service.find_started_lessons();
        assert_eq!(started.len(), 1);
        assert!(started[0].is_started());
        assert!(fixture.service.find_planned_lessons().is_empty());
        assert!(!room_available(&fixture));

        for id in [TEACHER, STUDENT] {
            let participant = person(&fixture, id);
            assert!(participant.is_during_lesson());
            assert_eq!(participant.current_lesson_id(), lesson.id());
            assert!(participant.future_lessons().is_empty());
        }
    }

    #[test]
    fn test_start_unknown_lesson_returns_false() {
        let fixture = setup();
        assert!(!fixture.service.start_lesson(42));
    }

    #[test]
    fn test_finish_computes_cost_from_duration_and_rent() {
        let fixture = setup();
        let begin = Utc::now() - Duration::seconds(90);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, true))
            .unwrap();

        assert!(fixture
            .service
            .finish_lesson_at(lesson.id(), begin + Duration::seconds(90)));

        // 90 s bills as 2 minutes: 2 * 100 + 1500 rent.
        let archived = fixture.service.archived_lessons().unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].total_cost(), 1700);

        assert!(room_available(&fixture));
        for id in [TEACHER, STUDENT] {
            let participant = person(&fixture, id);
            assert!(!participant.is_during_lesson());
            assert_eq!(participant.current_lesson_id(), NO_LESSON);
        }
        assert!(fixture.service.find_all_lessons().is_empty());
        assert!(fixture.service.get_lesson(lesson.id()).is_none());
    }

    #[test]
    fn test_finish_sub_minute_lesson_is_free() {
        let fixture = setup();
        let begin = Utc::now() - Duration::seconds(45);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, true))
            .unwrap();

        assert!(fixture
            .service
            .finish_lesson_at(lesson.id(), begin + Duration::seconds(45)));

        let archived = fixture.service.archived_lessons().unwrap();
        assert_eq!(archived[0].total_cost(), 0);
    }

    #[test]
    fn test_finish_with_degenerate_window_keeps_invalid_cost() {
        let fixture = setup();
        let begin = Utc::now();
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, true))
            .unwrap();

        // End exactly at begin: tolerated, cost stays invalid, lesson still
        // leaves the active set.
        assert!(fixture.service.finish_lesson_at(lesson.id(), begin));

        let archived = fixture.service.archived_lessons().unwrap();
        assert_eq!(archived[0].total_cost(), -1);
        assert_eq!(archived[0].end_time(), None);
        assert!(fixture.service.find_all_lessons().is_empty());
        assert!(room_available(&fixture));
    }

    #[test]
    fn test_finish_unknown_lesson_returns_false() {
        let fixture = setup();
        assert!(!fixture.service.finish_lesson(42));
    }

    #[test]
    fn test_finish_sweeps_every_matching_person() {
        let fixture = setup();
        let begin = Utc::now() - Duration::minutes(5);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, true))
            .unwrap();

        // A person outside the roster pointing at this lesson is swept too.
        {
            let mut persons = fixture.persons.lock().unwrap();
            let stray = persons.find_by_id_mut(STUDENT_2).unwrap();
            stray.set_during_lesson(true);
            stray.set_current_lesson(lesson.id());
        }

        assert!(fixture.service.finish_lesson(lesson.id()));

        let stray = person(&fixture, STUDENT_2);
        assert!(!stray.is_during_lesson());
        assert_eq!(stray.current_lesson_id(), NO_LESSON);
    }

    #[test]
    fn test_group_roster_lifecycle() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        let lesson = fixture
            .service
            .create_group_lesson(group_command(begin, false))
            .unwrap();

        fixture
            .service
            .add_student_to_group_lesson(lesson.id(), STUDENT)
            .unwrap();
        fixture
            .service
            .add_student_to_group_lesson(lesson.id(), STUDENT_2)
            .unwrap();

        let stored = fixture.service.get_lesson(lesson.id()).unwrap();
        assert_eq!(stored.student_ids(), vec![STUDENT, STUDENT_2]);
        assert_eq!(person(&fixture, STUDENT).future_lessons(), &[lesson.id()]);

        assert!(fixture.service.start_lesson(lesson.id()));
        for id in [TEACHER, STUDENT, STUDENT_2] {
            let participant = person(&fixture, id);
            assert!(participant.is_during_lesson());
            assert_eq!(participant.current_lesson_id(), lesson.id());
        }

        fixture
            .service
            .remove_student_from_group_lesson(lesson.id(), STUDENT)
            .unwrap();
        let stored = fixture.service.get_lesson(lesson.id()).unwrap();
        assert_eq!(stored.student_ids(), vec![STUDENT_2]);
        let removed = person(&fixture, STUDENT);
        assert!(!removed.is_during_lesson());
        assert_eq!(removed.current_lesson_id(), NO_LESSON);
    }

    #[test]
    fn test_joining_a_started_lesson_flags_the_student_immediately() {
        let fixture = setup();
        let lesson = fixture
            .service
            .create_group_lesson(group_command(Utc::now(), true))
            .unwrap();

        fixture
            .service
            .add_student_to_group_lesson(lesson.id(), STUDENT)
            .unwrap();

        let student = person(&fixture, STUDENT);
        assert!(student.is_during_lesson());
        assert_eq!(student.current_lesson_id(), lesson.id());
        assert!(student.future_lessons().is_empty());
    }

    #[test]
    fn test_group_operation_error_taxonomy() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        let group = fixture
            .service
            .create_group_lesson(group_command(begin, false))
            .unwrap();
        let individual = fixture
            .service
            .create_individual_lesson(individual_command(begin + Duration::hours(2), false))
            .unwrap();

        assert_eq!(
            fixture.service.add_student_to_group_lesson(999, STUDENT),
            Err(LessonError::LessonNotFound(999))
        );
        assert_eq!(
            fixture.service.add_student_to_group_lesson(group.id(), 999),
            Err(LessonError::UnknownPerson(999))
        );
        assert_eq!(
            fixture
                .service
                .add_student_to_group_lesson(individual.id(), STUDENT),
            Err(LessonError::NotGroupLesson(individual.id()))
        );

        // Roster untouched by the rejected calls.
        assert!(fixture
            .service
            .get_lesson(group.id())
            .unwrap()
            .student_ids()
            .is_empty());

        fixture
            .service
            .add_student_to_group_lesson(group.id(), STUDENT)
            .unwrap();

        // Student is not during-lesson yet.
        assert_eq!(
            fixture
                .service
                .remove_student_from_group_lesson(group.id(), STUDENT),
            Err(LessonError::NotParticipant { person_id: STUDENT })
        );
        assert_eq!(
            fixture
                .service
                .get_lesson(group.id())
                .unwrap()
                .student_ids(),
            vec![STUDENT]
        );

        // Busy in a different lesson.
        {
            let mut persons = fixture.persons.lock().unwrap();
            let student = persons.find_by_id_mut(STUDENT).unwrap();
            student.set_during_lesson(true);
            student.set_current_lesson(individual.id());
        }
        assert_eq!(
            fixture
                .service
                .remove_student_from_group_lesson(group.id(), STUDENT),
            Err(LessonError::NotAssignedToLesson {
                person_id: STUDENT,
                lesson_id: group.id(),
            })
        );
    }

    #[test]
    fn test_due_sweeps_drive_the_lifecycle() {
        let fixture = setup();
        let begin = Utc::now() - Duration::minutes(50);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();

        let now = Utc::now();
        assert_eq!(fixture.service.start_due_lessons(now), 1);
        assert!(fixture.service.find_started_lessons().len() == 1);
        assert!(person(&fixture, STUDENT).is_during_lesson());

        // Scheduled end (begin + 45 min) has passed as well.
        assert_eq!(fixture.service.finish_due_lessons(now), 1);
        assert!(fixture.service.find_all_lessons().is_empty());
        assert!(fixture.service.get_lesson(lesson.id()).is_none());
        assert!(room_available(&fixture));
    }

    #[test]
    fn test_sweeps_leave_lessons_that_are_not_due() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();

        let now = Utc::now();
        assert_eq!(fixture.service.start_due_lessons(now), 0);
        assert_eq!(fixture.service.finish_due_lessons(now), 0);
        assert_eq!(fixture.service.find_planned_lessons().len(), 1);
    }

    #[test]
    fn test_remove_lesson_archives_first() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        let lesson = fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();

        fixture.service.remove_lesson(lesson.id()).unwrap();
        assert!(fixture.service.find_all_lessons().is_empty());

        let archived = fixture.service.archived_lessons().unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id(), lesson.id());

        assert_eq!(
            fixture.service.remove_lesson(lesson.id()),
            Err(LessonError::LessonNotFound(lesson.id()))
        );
    }

    #[test]
    fn test_save_load_round_trip_seeds_the_id_sequence() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();
        let group = fixture
            .service
            .create_group_lesson(group_command(begin + Duration::hours(2), false))
            .unwrap();
        fixture
            .service
            .add_student_to_group_lesson(group.id(), STUDENT)
            .unwrap();
        fixture.service.save().unwrap();

        // Fresh engine over the same data directory.
        let connection = CsvConnection::new(fixture._temp_dir.path()).unwrap();
        let sequence = Arc::new(LessonIdSequence::new());
        let reloaded = LessonService::new(
            LessonRepository::shared(),
            fixture.persons.clone(),
            fixture.classrooms.clone(),
            LessonFileStorage::new(connection),
            sequence.clone(),
        );

        assert_eq!(reloaded.load().unwrap(), 2);
        assert_eq!(reloaded.find_all_lessons().len(), 2);
        assert_eq!(
            reloaded.get_lesson(group.id()).unwrap().student_ids(),
            vec![STUDENT]
        );
        // New ids continue past the loaded ones.
        assert_eq!(sequence.next(), group.id() + 1);
    }

    #[test]
    fn test_report_numbers_every_lesson() {
        let fixture = setup();
        let begin = Utc::now() + Duration::hours(1);
        fixture
            .service
            .create_individual_lesson(individual_command(begin, false))
            .unwrap();
        fixture
            .service
            .create_group_lesson(group_command(begin + Duration::hours(2), false))
            .unwrap();

        let report = fixture.service.report();
        assert!(report.starts_with("1. "));
        assert!(report.contains("\n2. "));
        assert!(report.contains("Algorithms"));
        assert!(report.contains("English B2"));
    }
}
