//! # hivres-core
//!
//! Core business logic for the HIV resistance report pipeline.
//!
//! This crate contains the pure pipeline stages and their orchestration:
//! - Mutation accumulation across a patient's resistance test history
//! - Semaphore classification of per-drug resistance levels
//! - Enrichment of the scoring payload with active-treatment evidence
//!
//! **No API concerns**: the HTTP harness lives in the root binary, the
//! outbound scoring call in `hivres-sierra` and record loading in
//! `hivres-records`. The only seam to the outside world is the
//! [`ScoringService`] trait implemented by the adapter.
//!
//! Failures inside the pipeline are represented as data, not as `Err`:
//! the scoring stage yields a tagged `{"error": true, "message": …}` JSON
//! value on failure, and every later stage passes that value through
//! untouched.

pub mod accumulator;
pub mod enricher;
pub mod pipeline;
pub mod semaphore;

pub use accumulator::{accumulate, AccumulatedHistory};
pub use enricher::enrich;
pub use pipeline::{run_report, ScoringService};
pub use semaphore::{Semaphore, SemaphoreConfig};
