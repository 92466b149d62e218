//! Antiretroviral (TARGA) treatment records.
//!
//! A treatment is **active** while it has no recorded end date. The
//! `targa_short` label may encode a drug combination joined by `+`
//! (e.g. `DRV+COBI`); the enricher splits it into individual drug tokens
//! when building the active-treatment index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prescribing detail attached to a treatment record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentInfo {
    /// Short TARGA label, possibly a `+`-joined combination (e.g. `DRV+COBI`).
    #[serde(default)]
    pub targa_short: String,

    /// Commercial brand name (e.g. `REZOLSTA`).
    #[serde(default)]
    pub brand: String,

    /// Free-text description, used as a brand fallback when `brand` is empty.
    #[serde(default)]
    pub text: String,
}

/// One entry in the patient's treatment history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentRecord {
    /// Date the treatment was started, when recorded.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Date the treatment was stopped; `None` means currently prescribed.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Prescribing detail.
    #[serde(default)]
    pub info: TreatmentInfo,
}

impl TreatmentRecord {
    /// True while the treatment has no recorded end date.
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }
}
