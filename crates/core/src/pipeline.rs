//! Report orchestration: accumulate, score, enrich.
//!
//! The three stages run strictly sequentially per report request. The only
//! suspension point is the scoring call behind [`ScoringService`];
//! cancellation and timeouts are the caller's responsibility. The pipeline
//! holds no shared mutable state, so concurrent invocations for different
//! patients need no coordination.

use crate::accumulator::accumulate;
use crate::enricher::{enrich, is_truthy};
use crate::semaphore::SemaphoreConfig;
use async_trait::async_trait;
use hivres_types::{AccumulatedMutations, ResistanceTestRecord, TreatmentRecord};
use serde_json::Value;

/// The external mutation-scoring service, seen from the pipeline.
///
/// Implementations make exactly one attempt per invocation and never fail
/// across this boundary: transport or status failures come back as a tagged
/// `{"error": true, "message": …}` value, a successful call as the parsed
/// response body verbatim.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Scores the accumulated mutation set against the service's drug panel.
    async fn score(&self, accumulated: &AccumulatedMutations) -> Value;
}

/// Runs the full report pipeline for one patient.
///
/// Accumulates the resistance history, scores the accumulated set through
/// `scorer`, and enriches the scoring payload with the treatment semaphore.
/// A scoring failure (error-shaped value) is returned as-is so the caller
/// can surface it; the enricher never sees it as enrichable input.
pub async fn run_report<S: ScoringService + ?Sized>(
    history: Option<&[ResistanceTestRecord]>,
    treatments: Option<&[TreatmentRecord]>,
    scorer: &S,
    cfg: &SemaphoreConfig,
) -> Value {
    let accumulated = accumulate(history);

    let payload = scorer.score(&accumulated.accumulated).await;
    if payload.get("error").map(is_truthy).unwrap_or(false) {
        tracing::warn!("scoring call failed, returning error payload without enrichment");
        return payload;
    }

    enrich(payload, treatments, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivres_types::{MutationSet, TreatmentInfo};
    use serde_json::json;
    use std::sync::Mutex;

    /// Stub scorer that records what it was asked to score.
    struct StubScorer {
        response: Value,
        seen: Mutex<Vec<AccumulatedMutations>>,
    }

    impl StubScorer {
        fn returning(response: Value) -> Self {
            Self {
                response,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScoringService for StubScorer {
        async fn score(&self, accumulated: &AccumulatedMutations) -> Value {
            self.seen.lock().unwrap().push(accumulated.clone());
            self.response.clone()
        }
    }

    fn history() -> Vec<ResistanceTestRecord> {
        vec![
            ResistanceTestRecord {
                mutations: MutationSet {
                    rt: vec!["M184V".into(), "K103N".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ResistanceTestRecord {
                mutations: MutationSet {
                    rt: vec!["K103N".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn scorer_receives_the_deduplicated_ordered_set() {
        let scorer = StubScorer::returning(json!({ "data": null }));
        let history = history();
        let treatments: Vec<TreatmentRecord> = vec![];

        run_report(
            Some(&history),
            Some(&treatments),
            &scorer,
            &SemaphoreConfig::default(),
        )
        .await;

        let seen = scorer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].rt, vec!["K103N", "M184V"]);
    }

    #[tokio::test]
    async fn scoring_error_short_circuits_enrichment() {
        let error = json!({ "error": true, "message": "connection refused" });
        let scorer = StubScorer::returning(error.clone());
        let treatments = vec![TreatmentRecord {
            info: TreatmentInfo {
                targa_short: "DTG".into(),
                brand: "TIVICAY".into(),
                text: String::new(),
            },
            ..Default::default()
        }];

        let report = run_report(
            None,
            Some(&treatments),
            &scorer,
            &SemaphoreConfig::default(),
        )
        .await;

        assert_eq!(report, error);
    }

    #[tokio::test]
    async fn successful_payload_is_enriched() {
        let scorer = StubScorer::returning(json!({
            "data": {
                "mutationsAnalysis": {
                    "drugResistance": [
                        {
                            "gene": { "name": "IN" },
                            "levels": [
                                { "drug": { "displayAbbr": "DTG" }, "text": "Susceptible" }
                            ]
                        }
                    ]
                }
            }
        }));
        let treatments = vec![TreatmentRecord {
            info: TreatmentInfo {
                targa_short: "DTG+3TC".into(),
                brand: "DOVATO".into(),
                text: String::new(),
            },
            ..Default::default()
        }];
        let history = history();

        let report = run_report(
            Some(&history),
            Some(&treatments),
            &scorer,
            &SemaphoreConfig::default(),
        )
        .await;

        let level = &report["data"]["mutationsAnalysis"]["drugResistance"][0]["levels"][0];
        assert_eq!(level["semaphore_name"], "GREEN");
        assert_eq!(level["display_status"], "PRESCRIBED");
        assert_eq!(level["matched_brands"], json!(["DOVATO"]));
    }
}
