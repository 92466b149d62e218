//! # hivres-types
//!
//! Shared domain and wire types for the HIV resistance report pipeline.
//!
//! This crate defines the records exchanged between the record store, the
//! mutation accumulator, the scoring service adapter and the treatment
//! enricher:
//! - Genotypic resistance test records and per-gene mutation sets
//! - Antiretroviral (TARGA) treatment records
//! - The accumulated mutation set derived from a patient's test history
//!
//! **No pipeline logic**: accumulation, scoring and enrichment live in
//! `hivres-core` and `hivres-sierra`.

pub mod resistance;
pub mod treatment;

pub use resistance::{AccumulatedMutations, Gene, MutationSet, ResistanceTestRecord};
pub use treatment::{TreatmentInfo, TreatmentRecord};
