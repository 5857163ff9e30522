use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// CsvConnection manages the data directory layout shared by all CSV
/// storages: one file per entity category at the root, plus an `archive/`
/// area holding the append-only files for soft-deleted records.
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a connection over a base directory, creating the layout if it
    /// does not exist yet.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }
        let archive_dir = base_path.join("archive");
        if !archive_dir.exists() {
            fs::create_dir_all(&archive_dir)?;
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default per-user data directory
    /// (`~/Documents/Training Center`).
    pub fn new_default() -> Result<Self> {
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let data_dir = PathBuf::from(home_dir)
            .join("Documents")
            .join("Training Center");
        info!("Using default data directory: {}", data_dir.display());

        Self::new(data_dir)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn persons_file(&self) -> PathBuf {
        self.base_directory.join("persons.csv")
    }

    pub fn classrooms_file(&self) -> PathBuf {
        self.base_directory.join("classrooms.csv")
    }

    pub fn lessons_file(&self) -> PathBuf {
        self.base_directory.join("lessons.csv")
    }

    pub fn persons_archive_file(&self) -> PathBuf {
        self.base_directory.join("archive").join("persons.csv")
    }

    pub fn classrooms_archive_file(&self) -> PathBuf {
        self.base_directory.join("archive").join("classrooms.csv")
    }

    pub fn lessons_archive_file(&self) -> PathBuf {
        self.base_directory.join("archive").join("lessons.csv")
    }
}
