use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::connection::CsvConnection;
use crate::domain::models::person::Person;
use crate::storage::traits::PersonStorage;

/// CSV-backed person persistence.
///
/// The active snapshot lives in `persons.csv` (with a header row); removed
/// people are appended to `archive/persons.csv` (no header, append-only).
#[derive(Debug, Clone)]
pub struct PersonFileStorage {
    connection: CsvConnection,
}

impl PersonFileStorage {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn write_record<W: std::io::Write>(writer: &mut Writer<W>, person: &Person) -> Result<()> {
        writer.write_record(&[
            person.id().to_string(),
            person.first_name().to_string(),
            person.last_name().to_string(),
            person.is_during_lesson().to_string(),
            person.current_lesson_id().to_string(),
        ])?;
        Ok(())
    }

    fn parse_record(record: &StringRecord) -> Result<Person> {
        let id: i32 = record
            .get(0)
            .context("missing id field")?
            .parse()
            .context("invalid person id")?;
        let first_name = record.get(1).context("missing first name")?;
        let last_name = record.get(2).context("missing last name")?;
        let during_lesson: bool = record
            .get(3)
            .context("missing during-lesson flag")?
            .parse()
            .context("invalid during-lesson flag")?;
        let current_lesson_id: i32 = record
            .get(4)
            .context("missing lesson id field")?
            .parse()
            .context("invalid lesson id")?;

        Ok(Person::from_parts(
            id,
            first_name,
            last_name,
            during_lesson,
            current_lesson_id,
        ))
    }

    fn read_file(path: &Path, has_headers: bool) -> Result<Vec<Person>> {
        if !path.exists() {
            debug!("Person file {} does not exist yet", path.display());
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(has_headers)
            .from_reader(BufReader::new(file));

        let mut persons = Vec::new();
        for result in reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(person) => persons.push(person),
                Err(e) => warn!("Skipping malformed person record {:?}: {}", record, e),
            }
        }
        Ok(persons)
    }
}

impl PersonStorage for PersonFileStorage {
    fn save_snapshot(&self, persons: &[Person]) -> Result<()> {
        let path = self.connection.persons_file();
        let temp_path = path.with_extension("tmp");

        {
            let file = File::create(&temp_path)?;
            let mut writer = Writer::from_writer(BufWriter::new(file));
            writer.write_record(["id", "first_name", "last_name", "during_lesson", "lesson_id"])?;
            for person in persons {
                Self::write_record(&mut writer, person)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;

        debug!("Saved {} persons to {}", persons.len(), path.display());
        Ok(())
    }

    fn load(&self) -> Result<Vec<Person>> {
        Self::read_file(&self.connection.persons_file(), true)
    }

    fn append_archive(&self, person: &Person) -> Result<()> {
        let path = self.connection.persons_archive_file();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        Self::write_record(&mut writer, person)?;
        writer.flush()?;
        Ok(())
    }

    fn load_archive(&self) -> Result<Vec<Person>> {
        Self::read_file(&self.connection.persons_archive_file(), false)
    }
}
