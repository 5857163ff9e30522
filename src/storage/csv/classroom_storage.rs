use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::connection::CsvConnection;
use crate::domain::models::classroom::{ClassRoom, ClassRoomType};
use crate::storage::traits::ClassRoomStorage;

/// CSV-backed classroom persistence.
///
/// One record per room: `number,available,seats,rent_cost,type,equipment`.
/// The `equipment` column holds the computer count for IT rooms and a `0`/`1`
/// flag for Math and English rooms.
#[derive(Debug, Clone)]
pub struct ClassRoomFileStorage {
    connection: CsvConnection,
}

impl ClassRoomFileStorage {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn equipment_field(room_type: &ClassRoomType) -> String {
        match room_type {
            ClassRoomType::It { computer_count } => computer_count.to_string(),
            ClassRoomType::Math { has_formula_tables } => i32::from(*has_formula_tables).to_string(),
            ClassRoomType::English { has_headphones } => i32::from(*has_headphones).to_string(),
        }
    }

    fn write_record<W: std::io::Write>(writer: &mut Writer<W>, room: &ClassRoom) -> Result<()> {
        writer.write_record(&[
            room.number().to_string(),
            room.is_available().to_string(),
            room.seats_number().to_string(),
            room.rent_cost().to_string(),
            room.room_type().type_tag().to_string(),
            Self::equipment_field(room.room_type()),
        ])?;
        Ok(())
    }

    fn parse_record(record: &StringRecord) -> Result<ClassRoom> {
        let number: i32 = record
            .get(0)
            .context("missing room number")?
            .parse()
            .context("invalid room number")?;
        let available: bool = record
            .get(1)
            .context("missing availability flag")?
            .parse()
            .context("invalid availability flag")?;
        let seats_number: i32 = record
            .get(2)
            .context("missing seat count")?
            .parse()
            .context("invalid seat count")?;
        let rent_cost: f64 = record
            .get(3)
            .context("missing rent cost")?
            .parse()
            .context("invalid rent cost")?;
        let type_tag = record.get(4).context("missing room type tag")?;
        let equipment: i32 = record
            .get(5)
            .context("missing equipment field")?
            .parse()
            .context("invalid equipment field")?;

        let room_type = match type_tag {
            "IT" => ClassRoomType::It {
                computer_count: equipment,
            },
            "MATH" => ClassRoomType::Math {
                has_formula_tables: equipment == 1,
            },
            "ENG" => ClassRoomType::English {
                has_headphones: equipment == 1,
            },
            other => bail!("unknown room type tag: {}", other),
        };

        Ok(ClassRoom::new(
            number,
            available,
            seats_number,
            rent_cost,
            room_type,
        ))
    }

    fn read_file(path: &Path, has_headers: bool) -> Result<Vec<ClassRoom>> {
        if !path.exists() {
            debug!("Classroom file {} does not exist yet", path.display());
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(has_headers)
            .from_reader(BufReader::new(file));

        let mut rooms = Vec::new();
        for result in reader.records() {
            let record = result?;
            match Self::parse_record(&record) {
                Ok(room) => rooms.push(room),
                Err(e) => warn!("Skipping malformed classroom record {:?}: {}", record, e),
            }
        }
        Ok(rooms)
    }
}

impl ClassRoomStorage for ClassRoomFileStorage {
    fn save_snapshot(&self, rooms: &[ClassRoom]) -> Result<()> {
        let path = self.connection.classrooms_file();
        let temp_path = path.with_extension("tmp");

        {
            let file = File::create(&temp_path)?;
            let mut writer = Writer::from_writer(BufWriter::new(file));
            writer.write_record(["number", "available", "seats", "rent_cost", "type", "equipment"])?;
            for room in rooms {
                Self::write_record(&mut writer, room)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;

        debug!("Saved {} classrooms to {}", rooms.len(), path.display());
        Ok(())
    }

    fn load(&self) -> Result<Vec<ClassRoom>> {
        Self::read_file(&self.connection.classrooms_file(), true)
    }

    fn append_archive(&self, room: &ClassRoom) -> Result<()> {
        let path = self.connection.classrooms_archive_file();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        Self::write_record(&mut writer, room)?;
        writer.flush()?;
        Ok(())
    }

    fn load_archive(&self) -> Result<Vec<ClassRoom>> {
        Self::read_file(&self.connection.classrooms_archive_file(), false)
    }
}
