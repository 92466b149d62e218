//! Resistance test records and per-gene mutation sets.
//!
//! These types mirror the wire shape of the patient record store: each
//! historical genotypic test carries one list of mutation codes per viral
//! gene. Mutation codes are short alphanumeric strings of the form
//! `<wild-type residue><codon number><mutant residue>` (e.g. `M41L`), or a
//! suffix-qualified special code such as `69Insertion`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three viral genes tracked for resistance mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gene {
    /// Protease (PR).
    Protease,
    /// Reverse transcriptase (RT).
    ReverseTranscriptase,
    /// Integrase (IN).
    Integrase,
}

impl Gene {
    /// All genes in the fixed wire order: PR, RT, IN.
    pub const ALL: [Gene; 3] = [
        Gene::Protease,
        Gene::ReverseTranscriptase,
        Gene::Integrase,
    ];

    /// The short gene tag used to prefix mutation codes on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            Gene::Protease => "PR",
            Gene::ReverseTranscriptase => "RT",
            Gene::Integrase => "IN",
        }
    }
}

/// One list of mutation codes per viral gene.
///
/// Serialises with the store's lowercase gene keys (`pr`, `rt`, `in`);
/// missing keys deserialise as empty lists rather than failing the record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSet {
    /// Protease mutations.
    #[serde(default)]
    pub pr: Vec<String>,

    /// Reverse transcriptase mutations.
    #[serde(default)]
    pub rt: Vec<String>,

    /// Integrase mutations.
    #[serde(default)]
    pub r#in: Vec<String>,
}

impl MutationSet {
    /// The mutation list for one gene.
    pub fn gene(&self, gene: Gene) -> &[String] {
        match gene {
            Gene::Protease => &self.pr,
            Gene::ReverseTranscriptase => &self.rt,
            Gene::Integrase => &self.r#in,
        }
    }

    /// True when every gene list is empty.
    pub fn is_empty(&self) -> bool {
        self.pr.is_empty() && self.rt.is_empty() && self.r#in.is_empty()
    }
}

/// One historical genotypic resistance test, immutable once read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResistanceTestRecord {
    /// Date the test was performed, when recorded.
    #[serde(default)]
    pub test_date: Option<NaiveDate>,

    /// Test type label (e.g. `genotypic`).
    #[serde(default)]
    pub test_type: String,

    /// Mutations detected by this test, per gene.
    #[serde(default)]
    pub mutations: MutationSet,

    /// Whether the lab flagged this test as carrying mutations.
    ///
    /// Descriptive metadata only: codes present in `mutations` are always
    /// accumulated regardless of this flag.
    #[serde(default)]
    pub has_mutation: bool,
}

/// Deduplicated, codon-ordered mutation set accumulated across a patient's
/// whole test history.
///
/// Derived data: recomputed for every report, never persisted. All three
/// gene keys are always present, even when empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedMutations {
    /// Accumulated protease mutations.
    #[serde(default)]
    pub pr: Vec<String>,

    /// Accumulated reverse transcriptase mutations.
    #[serde(default)]
    pub rt: Vec<String>,

    /// Accumulated integrase mutations.
    #[serde(default)]
    pub r#in: Vec<String>,
}

impl AccumulatedMutations {
    /// The accumulated mutation list for one gene.
    pub fn gene(&self, gene: Gene) -> &[String] {
        match gene {
            Gene::Protease => &self.pr,
            Gene::ReverseTranscriptase => &self.rt,
            Gene::Integrase => &self.r#in,
        }
    }

    /// True when no gene carries any accumulated mutation.
    pub fn is_empty(&self) -> bool {
        self.pr.is_empty() && self.rt.is_empty() && self.r#in.is_empty()
    }
}
