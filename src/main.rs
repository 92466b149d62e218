use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hivres_core::{run_report, SemaphoreConfig};
use hivres_records::{RecordError, RecordStore};
use hivres_sierra::{SierraClient, DEFAULT_ENDPOINT};

/// Application state shared across REST API handlers
///
/// Resolved once at startup; request handlers never read the environment.
#[derive(Clone)]
struct AppState {
    store: RecordStore,
    sierra: SierraClient,
    semaphores: SemaphoreConfig,
}

#[derive(OpenApi)]
#[openapi(paths(health, hiv_report), components(schemas(HealthRes, ErrorBody)))]
struct ApiDoc;

/// Health check response body.
#[derive(Serialize, utoipa::ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

/// Error body returned on every non-200 response.
#[derive(Serialize, utoipa::ToSchema)]
struct ErrorBody {
    error: bool,
    message: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
struct ReportParams {
    /// Patient identifier (e.g. 76 for patient_76.json)
    pat_id: Option<String>,
}

/// Main entry point for the hivres report harness
///
/// Starts the REST server that computes the full HIV resistance report for
/// one patient per request: accumulate mutations, score them through the
/// Sierra service, enrich with the treatment semaphore.
///
/// # Environment Variables
/// - `HIVRES_REST_ADDR`: REST server address (default: "0.0.0.0:3003")
/// - `PATIENT_DATA_DIR`: Directory holding patient_<id>.json files (default: "/patient_data")
/// - `SIERRA_URL`: Sierra GraphQL endpoint (default: the public Stanford endpoint)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("hivres=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("HIVRES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3003".into());
    let data_dir = std::env::var("PATIENT_DATA_DIR").unwrap_or_else(|_| "/patient_data".into());
    let sierra_url = std::env::var("SIERRA_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());

    tracing::info!("++ Starting hivres REST on {}", rest_addr);
    tracing::info!("++ Patient data dir: {}", data_dir);
    tracing::info!("++ Sierra endpoint: {}", sierra_url);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/hiv-report", get(hiv_report))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            store: RecordStore::new(data_dir),
            sierra: SierraClient::new(sierra_url),
            semaphores: SemaphoreConfig::default(),
        });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "hivres is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/hiv-report",
    params(ReportParams),
    responses(
        (status = 200, description = "Enriched resistance report"),
        (status = 400, description = "Missing or invalid pat_id", body = ErrorBody),
        (status = 404, description = "No record for this patient", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Compute the full HIV resistance report for one patient
///
/// Loads the patient's stored record and runs the three-stage pipeline.
/// The report is computed fresh from the point-in-time record on every
/// call; nothing is cached or persisted.
///
/// A scoring failure is not a harness failure: the adapter converts it to
/// a tagged error payload, which is returned with status 200 for the
/// client to inspect.
///
/// # Returns
/// * `Ok(Json<Value>)` - The enriched scoring payload (or the tagged error payload)
/// * `Err((StatusCode, Json<ErrorBody>))` - 400/404/500 with a JSON error body
async fn hiv_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorBody>)> {
    let Some(pat_id) = params.pat_id else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing pat_id query parameter",
        ));
    };

    let record = match state.store.load_patient(&pat_id) {
        Ok(record) => record,
        Err(err @ RecordError::InvalidId(_)) => {
            return Err(error_response(StatusCode::BAD_REQUEST, err.to_string()));
        }
        Err(err @ RecordError::NotFound(_)) => {
            return Err(error_response(StatusCode::NOT_FOUND, err.to_string()));
        }
        Err(err) => {
            tracing::error!("failed to load record for patient {}: {:?}", pat_id, err);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
            ));
        }
    };

    let report = run_report(
        Some(&record.resistance_history),
        Some(&record.treatment_history),
        &state.sierra,
        &state.semaphores,
    )
    .await;

    Ok(Json(report))
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: true,
            message: message.into(),
        }),
    )
}
