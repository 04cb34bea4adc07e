//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.
//!
//! Records are written with `csv`'s serde support, so archived types must be flat (no nested
//! structs or maps). Each record type is expected to carry its own `time_s` column.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{self, File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not create the archive file: {0}")]
    FileCreateError(std::io::Error),

    #[error("Could not write the archive record: {0}")]
    WriteError(csv::Error),

    #[error("Could not flush the archive file: {0}")]
    FlushError(std::io::Error)
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have an `Archiver` member which
/// shall be setup in the struct's `init` or `new` functions. 
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        Self::from_abs_path(session_path)
    }

    /// Create a new archiver writing to the given absolute path, creating any parent
    /// directories needed.
    pub fn from_abs_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::FileCreateError)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(ArchiveError::FileCreateError)?;

        Ok(Self {
            writer: Some(WriterBuilder::new()
                .has_headers(true)
                .from_writer(file))
        })
    }

    /// Serialise a single record into the archive.
    ///
    /// An archiver which was never opened (the `Default` one) silently drops records.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::WriteError)?;
                w.flush().map_err(ArchiveError::FlushError)
            },
            None => Ok(())
        }
    }

    /// Returns true if this archiver is writing to a file.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Record {
        time_s: f64,
        num_targets: usize,
        mode: &'static str,
    }

    #[test]
    fn test_archiver_writes_header_and_rows() {
        let mut path = std::env::temp_dir();
        path.push(format!("collector_archive_test_{}", std::process::id()));
        path.push("records.csv");

        let mut arch = Archiver::from_abs_path(&path).unwrap();
        assert!(arch.is_open());

        arch.serialise(Record { time_s: 0.1, num_targets: 3, mode: "Driving" }).unwrap();
        arch.serialise(Record { time_s: 0.2, num_targets: 2, mode: "Turning" }).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines, vec![
            "time_s,num_targets,mode",
            "0.1,3,Driving",
            "0.2,2,Turning",
        ]);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_default_archiver_drops_records() {
        let mut arch = Archiver::default();
        assert!(!arch.is_open());
        assert!(arch.serialise(Record { time_s: 0.0, num_targets: 0, mode: "Idle" }).is_ok());
    }
}
