use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::connection::CsvConnection;
use crate::domain::models::lesson::{Lesson, LessonKind};
use crate::storage::traits::LessonStorage;

/// CSV-backed lesson persistence.
///
/// One record per lesson, kind tag first:
/// `kind,id,teacher_id,classroom,base_cost,subject,begin,end,started,total_cost,students`.
/// Times are RFC 3339; an empty `end` column means the end time is unset.
/// `students` joins roster ids with `;` (a single id for individual
/// lessons). The archive file has the same layout, without a header.
#[derive(Debug, Clone)]
pub struct LessonFileStorage {
    connection: CsvConnection,
}

const TAG_INDIVIDUAL: &str = "INDIVIDUAL";
const TAG_GROUP: &str = "GROUP";

impl LessonFileStorage {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn kind_tag(lesson: &Lesson) -> &'static str {
        if lesson.is_group() {
            TAG_GROUP
        } else {
            TAG_INDIVIDUAL
        }
    }

    fn write_record<W: std::io::Write>(writer: &mut Writer<W>, lesson: &Lesson) -> Result<()> {
        let end = lesson
            .end_time()
            .map(|end| end.to_rfc3339())
            .unwrap_or_default();
        let students = lesson
            .student_ids()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(";");

        writer.write_record(&[
            Self::kind_tag(lesson).to_string(),
            lesson.id().to_string(),
            lesson.teacher_id().to_string(),
            lesson.classroom_number().to_string(),
            lesson.base_cost().to_string(),
            lesson.subject().to_string(),
            lesson.begin_time().to_rfc3339(),
            end,
            lesson.is_started().to_string(),
            lesson.total_cost().to_string(),
            students,
        ])?;
        Ok(())
    }

    fn parse_time(field: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(field)
            .context("invalid timestamp")?
            .with_timezone(&Utc))
    }

    fn parse_record(record: &StringRecord) -> Result<Lesson> {
        let kind_tag = record.get(0).context("missing kind tag")?;
        let id: i32 = record
            .get(1)
            .context("missing lesson id")?
            .parse()
            .context("invalid lesson id")?;
        let teacher_id: i32 = record
            .get(2)
            .context("missing teacher id")?
            .parse()
            .context("invalid teacher id")?;
        let classroom_number: i32 = record
            .get(3)
            .context("missing classroom number")?
            .parse()
            .context("invalid classroom number")?;
        let base_cost: i64 = record
            .get(4)
            .context("missing base cost")?
            .parse()
            .context("invalid base cost")?;
        let subject = record.get(5).context("missing subject")?;
        let begin_time = Self::parse_time(record.get(6).context("missing begin time")?)?;
        let end_field = record.get(7).context("missing end time field")?;
        let end_time = if end_field.is_empty() {
            None
        } else {
            Some(Self::parse_time(end_field)?)
        };
        let started: bool = record
            .get(8)
            .context("missing started flag")?
            .parse()
            .context("invalid started flag")?;
        let total_cost: i64 = record
            .get(9)
            .context("missing total cost")?
            .parse()
            .context("invalid total cost")?;
        let students_field = record.get(10).context("missing students field")?;

        let mut student_ids = Vec::new();
        for part in students_field.split(';').filter(|p| !p.is_empty()) {
            student_ids.push(part.parse::<i32>().context("invalid student id")?);
        }

        let kind = match kind_tag {
            TAG_INDIVIDUAL => {
                let student_id = *student_ids
                    .first()
                    .context("individual lesson without a student")?;
                LessonKind::Individual { student_id }
            }
            TAG_GROUP => LessonKind::Group { student_ids },
            other => bail!("unknown lesson kind tag: {}", other),
        };

        Ok(Lesson::restore(
            id,
            teacher_id,
            begin_time,
            end_time,
            base_cost,
            subject,
            classroom_number,
            started,
            total_cost,
            kind,
        ))
    }

    fn read_file(path: &Path, has_headers: bool) -> Result<Vec<Lesson>> {
        if !path.exists() {
            debug!("Lesson file {} does not exist yet", path.display());
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(has_headers)
            .from_reader(BufReader::new(file));

        let mut lessons = Vec::new();
        for result in reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => warn!("Skipping malformed lesson record {:?}: {}", record, e),
            }
        }
        Ok(lessons)
    }
}

impl LessonStorage for LessonFileStorage {
    fn save_snapshot(&self, lessons: &[Lesson]) -> Result<()> {
        let path = self.connection.lessons_file();
        let temp_path = path.with_extension("tmp");

        {
            let file = File::create(&temp_path)?;
            let mut writer = Writer::from_writer(BufWriter::new(file));
            writer.write_record([
                "kind",
                "id",
                "teacher_id",
                "classroom",
                "base_cost",
                "subject",
                "begin",
                "end",
                "started",
                "total_cost",
                "students",
            ])?;
            for lesson in lessons {
                Self::write_record(&mut writer, lesson)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;

        debug!("Saved {} lessons to {}", lessons.len(), path.display());
        Ok(())
    }

    fn load(&self) -> Result<Vec<Lesson>> {
        Self::read_file(&self.connection.lessons_file(), true)
    }

    fn append_archive(&self, lesson: &Lesson) -> Result<()> {
        let path = self.connection.lessons_archive_file();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        Self::write_record(&mut writer, lesson)?;
        writer.flush()?;
        Ok(())
    }

    fn load_archive(&self) -> Result<Vec<Lesson>> {
        Self::read_file(&self.connection.lessons_archive_file(), false)
    }
}
