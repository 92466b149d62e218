//! # hivres-records
//!
//! Patient record loading for the HIV resistance report pipeline.
//!
//! Records live as one JSON file per patient, `patient_<id>.json`, under a
//! data directory resolved at startup. A record exposes the two histories
//! the pipeline consumes; absence of either key is an empty sequence, not
//! an error.
//!
//! **No pipeline logic**: this crate only reads and deserialises records.

use hivres_types::{ResistanceTestRecord, TreatmentRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Failures while loading a patient record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid patient id: {0}")]
    InvalidId(String),
    #[error("no record found for patient {0}")]
    NotFound(String),
    #[error("failed to read patient file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize patient record: {0}")]
    Deserialization(serde_json::Error),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// One patient's point-in-time record, as stored on disk.
///
/// Unknown keys in the stored JSON (demographics, lab panels, …) are
/// ignored; only the histories the pipeline consumes are deserialised.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Genotypic resistance test history, oldest data included.
    #[serde(default)]
    pub resistance_history: Vec<ResistanceTestRecord>,

    /// Antiretroviral treatment history.
    #[serde(default)]
    pub treatment_history: Vec<TreatmentRecord>,
}

/// File-backed patient record store.
#[derive(Clone, Debug)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The directory this store reads from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads the record for one patient from `patient_<id>.json`.
    ///
    /// # Errors
    ///
    /// - [`RecordError::InvalidId`] when the id contains characters other
    ///   than ASCII alphanumerics, `-` or `_` (keeps ids from escaping the
    ///   data directory).
    /// - [`RecordError::NotFound`] when no file exists for the id.
    /// - [`RecordError::FileRead`] / [`RecordError::Deserialization`] when
    ///   the file cannot be read or parsed.
    pub fn load_patient(&self, id: &str) -> RecordResult<PatientRecord> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RecordError::InvalidId(id.to_string()));
        }

        let path = self.data_dir.join(format!("patient_{id}.json"));
        if !path.is_file() {
            return Err(RecordError::NotFound(id.to_string()));
        }

        let raw = fs::read_to_string(&path).map_err(RecordError::FileRead)?;
        let record = serde_json::from_str(&raw).map_err(RecordError::Deserialization)?;

        tracing::debug!(patient = id, path = %path.display(), "loaded patient record");
        Ok(record)
    }
}
