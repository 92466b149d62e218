//! Mutation accumulation across a patient's resistance test history.
//!
//! Repeated genotypic tests are collapsed into one deduplicated mutation
//! set per viral gene, ordered ascending by codon number. The result is
//! derived data: it is recomputed for every report and never persisted.

use hivres_types::{AccumulatedMutations, Gene, ResistanceTestRecord};
use std::collections::HashSet;

/// The normalised history together with its accumulated mutation set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulatedHistory {
    /// The input history, echoed unchanged.
    pub history: Vec<ResistanceTestRecord>,

    /// Deduplicated, codon-ordered mutations per gene.
    pub accumulated: AccumulatedMutations,
}

/// Collapses a resistance test history into a deduplicated, codon-ordered
/// mutation set per gene.
///
/// Every non-empty code found in a record's `mutations` lists is unioned
/// into the matching gene accumulator, regardless of the record's
/// `has_mutation` flag (the flag is descriptive metadata, not an inclusion
/// gate). Codes are deduplicated with set semantics and sorted ascending by
/// the first run of digits in the code; codes with no digits sort after all
/// numbered codes. Ties keep first-insertion order (stable sort).
///
/// `None` input is the defensive default for a missing or malformed
/// history: it yields empty gene sets and an empty echoed history rather
/// than an error.
///
/// Pure and deterministic: identical input order always produces an
/// identical result.
pub fn accumulate(history: Option<&[ResistanceTestRecord]>) -> AccumulatedHistory {
    let Some(history) = history else {
        return AccumulatedHistory::default();
    };

    AccumulatedHistory {
        history: history.to_vec(),
        accumulated: AccumulatedMutations {
            pr: collect_gene(history, Gene::Protease),
            rt: collect_gene(history, Gene::ReverseTranscriptase),
            r#in: collect_gene(history, Gene::Integrase),
        },
    }
}

/// Extracts the codon number from a mutation code: the first run of ASCII
/// digits (e.g. `M41L` → 41, `69Insertion` → 69). `None` when the code
/// carries no digits.
pub fn codon_number(code: &str) -> Option<u32> {
    let start = code.find(|c: char| c.is_ascii_digit())?;
    let digits: &str = &code[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

fn collect_gene(history: &[ResistanceTestRecord], gene: Gene) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut codes = Vec::new();

    for record in history {
        for code in record.mutations.gene(gene) {
            if code.is_empty() {
                continue;
            }
            if seen.insert(code.clone()) {
                codes.push(code.clone());
            }
        }
    }

    // Stable sort: codeless entries go last, ties keep insertion order.
    codes.sort_by_key(|code| codon_number(code).unwrap_or(u32::MAX));
    codes
}
