/**
 * HTTP Routes
 * Verification endpoint, health probe and CORS handling
 */

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::biometric::{BiometricService, MatchResult};
use crate::engine::FingerprintEngine;
use crate::error::ApiError;

pub struct AppState<E> {
    pub biometric: Arc<BiometricService<E>>,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            biometric: Arc::clone(&self.biometric),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    // Missing or null fields become empty strings and fail as invalid input.
    #[serde(default)]
    probe_png: Option<String>,
    #[serde(default)]
    candidate_png: Option<String>,
}

pub fn router<E: FingerprintEngine>(state: AppState<E>, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/verify", post(verify::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .layer(middleware::from_fn(preflight_no_content))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn verify<E: FingerprintEngine>(
    State(state): State<AppState<E>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<MatchResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected verification body: {}", rejection.body_text());
        ApiError::MalformedBody(rejection.body_text())
    })?;

    // Decode and matching are CPU bound; keep them off the async workers
    let service = Arc::clone(&state.biometric);
    let probe_png = request.probe_png.unwrap_or_default();
    let candidate_png = request.candidate_png.unwrap_or_default();
    let result = tokio::task::spawn_blocking(move || service.verify(&probe_png, &candidate_png))
        .await
        .map_err(|e| {
            warn!("Verification worker failed: {e}");
            ApiError::Worker
        })?
        .map_err(|e| {
            warn!("Verification rejected: {e}");
            ApiError::from(e)
        })?;

    info!(
        "Verification: score={} threshold={} match={}",
        result.score, result.threshold, result.is_match
    );

    Ok(Json(result))
}

/// Answers every preflight with an empty 204, keeping the CORS headers.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;

    if is_preflight {
        *response.status_mut() = StatusCode::NO_CONTENT;
        *response.body_mut() = Body::empty();
    }

    response
}
