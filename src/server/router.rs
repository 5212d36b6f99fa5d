use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use disposition_flow::{report, BpmLookupRequest, BpmLookupResponse};
use firco_core_types::{BpmRowStatus, DispositionOutcome, ErrorKind, RawTransactionRequest};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use super::state::ServeState;
use crate::metrics;

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/api", post(process_handler))
        .route("/api/bpm", post(bpm_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_proxy_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn process_handler(
    State(state): State<ServeState>,
    body: Result<Json<RawTransactionRequest>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "malformed request body");
            let outcome = DispositionOutcome::failed(
                ErrorKind::Validation,
                format!("Malformed request body: {}", rejection.body_text()),
            );
            let body = report(&outcome, "", &Local::now());
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let _in_flight = state.health.begin();
    let processed = state.service.process(&raw).await;
    let status = if processed.report.is_validation_error() {
        StatusCode::BAD_REQUEST
    } else {
        if !processed.report.success {
            state.health.record_error(processed.report.message.clone());
        }
        StatusCode::OK
    };
    (status, Json(processed.report)).into_response()
}

async fn bpm_handler(
    State(state): State<ServeState>,
    body: Result<Json<BpmLookupRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let response = BpmLookupResponse::error(
                BpmRowStatus::Invalid,
                format!("Malformed request body: {}", rejection.body_text()),
            );
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let _in_flight = state.health.begin();
    let response = state.service.lookup(&request).await;
    let status = if response.results.bmp_result.status == BpmRowStatus::Invalid {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(response)).into_response()
}

async fn health_handler(State(state): State<ServeState>) -> impl IntoResponse {
    Json(state.health.snapshot())
}

async fn metrics_proxy_handler() -> Response {
    metrics::register_metrics();
    metrics::render(metrics::global_registry())
}
