//! Session save file
//!
//! Plain text, one value per line:
//!
//! ```text
//! 2026-10-17      date stamp (local)
//! 754             seconds elapsed in the current phase
//! 8454            seconds studied today
//! 3               completed study phases
//! 0               current phase id
//! 3               completions of the current phase
//! 1792226372      current phase start (Unix seconds)
//! ```
//!
//! A save is only offered for resume when its date stamp is today.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::session::{PhaseKind, SessionSnapshot};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Save file is missing the {0} field")]
    MissingField(&'static str),

    #[error("Invalid {field} in save file: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid date stamp in save file: {0:?}")]
    InvalidDate(String),

    #[error("Unknown phase id {0} in save file")]
    UnknownPhase(u8),
}

/// Contents of a save file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    pub date: NaiveDate,
    pub phase_elapsed: u64,
    pub study_elapsed: u64,
    pub study_phase_count: u32,
    pub phase: PhaseKind,
    pub completed: u32,
    pub started_at: i64,
}

impl SaveRecord {
    pub fn from_snapshot(snapshot: &SessionSnapshot, date: NaiveDate) -> Self {
        Self {
            date,
            phase_elapsed: snapshot.phase_elapsed,
            study_elapsed: snapshot.study_elapsed,
            study_phase_count: snapshot.study_phase_count,
            phase: snapshot.phase,
            completed: snapshot.completed,
            started_at: snapshot.started_at,
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            self.date.format(DATE_FORMAT),
            self.phase_elapsed,
            self.study_elapsed,
            self.study_phase_count,
            self.phase.id(),
            self.completed,
            self.started_at,
        )
    }

    pub fn parse(content: &str) -> Result<Self, SaveError> {
        let mut lines = content.lines().map(str::trim);
        let mut next = |field: &'static str| lines.next().ok_or(SaveError::MissingField(field));

        let raw_date = next("date")?;
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|_| SaveError::InvalidDate(raw_date.to_string()))?;

        let phase_elapsed = number(next("phase elapsed")?, "phase elapsed")?;
        let study_elapsed = number(next("study elapsed")?, "study elapsed")?;
        let study_phase_count = number(next("study phase count")?, "study phase count")?;
        let phase_id: u8 = number(next("phase id")?, "phase id")?;
        let phase = PhaseKind::from_id(phase_id).ok_or(SaveError::UnknownPhase(phase_id))?;
        let completed = number(next("completed")?, "completed")?;
        let started_at = number(next("phase start")?, "phase start")?;

        Ok(Self {
            date,
            phase_elapsed,
            study_elapsed,
            study_phase_count,
            phase,
            completed,
            started_at,
        })
    }
}

fn number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, SaveError> {
    value.parse().map_err(|_| SaveError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Location of the save file
#[derive(Debug, Clone)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<SaveRecord, SaveError> {
        let content = fs::read_to_string(&self.path)?;
        SaveRecord::parse(&content)
    }

    pub fn write(&self, record: &SaveRecord) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, record.to_text())?;
        Ok(())
    }

    /// The saved session, if there is a readable one stamped `today`
    pub fn load_for(&self, today: NaiveDate) -> Option<SaveRecord> {
        match self.read() {
            Ok(record) if record.date == today => {
                tracing::info!("Found a save from today in {}", self.path.display());
                Some(record)
            }
            Ok(record) => {
                tracing::info!("Ignoring save from {}", record.date);
                None
            }
            Err(SaveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable save {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
