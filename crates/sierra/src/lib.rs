//! # hivres-sierra
//!
//! Adapter for the Stanford HIVdb (Sierra) mutation-scoring service.
//!
//! Translates an accumulated mutation set into Sierra's wire format
//! (gene-tagged mutation codes), issues exactly one GraphQL call, and
//! normalises failures into the tagged `{"error": true, "message": …}`
//! value the pipeline expects. Nothing is raised past this boundary:
//! callers check the `error` field instead of catching errors.
//!
//! The adapter performs no retries and sets no timeout of its own; the
//! caller controls cancellation externally, and an aborted request
//! surfaces as the error shape like any other transport failure.

use async_trait::async_trait;
use hivres_core::ScoringService;
use hivres_types::{AccumulatedMutations, Gene};
use serde_json::{json, Value};

/// Public Sierra GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://hivdb.stanford.edu/graphql";

const OPERATION_NAME: &str = "ResistanceReport";

/// Fixed query document selecting drug-resistance levels, mutation
/// annotations and per-drug scores.
///
/// Protocol constant: downstream enrichment depends on the per-level
/// `drug.displayAbbr` and `text` selections, so the field selection must
/// not change.
const RESISTANCE_QUERY: &str = r#"
query ResistanceReport($mutations: [String]!) {
  mutationsAnalysis(mutations: $mutations) {
    validationResults { level message }
    mutations { text primaryType isUnusual }
    drugResistance {
      gene { name drugClasses { name fullName } }
      levels: drugScores {
        drugClass { name }
        drug { name displayAbbr fullName }
        text
        score
      }
      drugScores {
        drugClass { name }
        drug { name displayAbbr }
        score
        partialScores { mutations { text } score }
      }
    }
  }
}
"#;

/// Failures of a single scoring attempt.
///
/// Internal to the adapter: the public [`ScoringService`] surface converts
/// these into the tagged error value.
#[derive(Debug, thiserror::Error)]
pub enum SierraError {
    #[error("failed to reach the scoring service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scoring service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode scoring response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Client for the Sierra scoring service.
#[derive(Clone, Debug)]
pub struct SierraClient {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for SierraClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl SierraClient {
    /// Creates a client against the given GraphQL endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint this client calls.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Flattens an accumulated mutation set into Sierra's single list of
    /// gene-tagged codes (`PR:L10F`, `RT:K103N`, …), in the fixed gene
    /// order PR, RT, IN.
    pub fn flatten_mutations(accumulated: &AccumulatedMutations) -> Vec<String> {
        Gene::ALL
            .iter()
            .flat_map(|gene| {
                accumulated
                    .gene(*gene)
                    .iter()
                    .map(move |code| format!("{}:{}", gene.tag(), code))
            })
            .collect()
    }

    /// One scoring attempt: builds the GraphQL body, POSTs it, and parses
    /// the response. Non-2xx statuses and undecodable bodies are errors; a
    /// decodable body of unexpected shape passes through untouched.
    async fn request(&self, mutations: Vec<String>) -> Result<Value, SierraError> {
        let body = json!({
            "operationName": OPERATION_NAME,
            "query": RESISTANCE_QUERY,
            "variables": { "mutations": mutations },
        });

        let response = self.http.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SierraError::Status(status));
        }

        response.json::<Value>().await.map_err(SierraError::Decode)
    }
}

#[async_trait]
impl ScoringService for SierraClient {
    async fn score(&self, accumulated: &AccumulatedMutations) -> Value {
        let mutations = Self::flatten_mutations(accumulated);
        tracing::debug!(count = mutations.len(), "scoring accumulated mutations");

        match self.request(mutations).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("scoring call failed: {err}");
                json!({ "error": true, "message": err.to_string() })
            }
        }
    }
}
