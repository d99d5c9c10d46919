//! HTTP API surface.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analyzer::{self, AnalysisResult, AnalyzeError, DEFAULT_TARGET_COUNT};
use crate::classifier::ClassifierService;
use crate::playstore::ReviewSource;

pub struct AppState {
    pub source: Arc<dyn ReviewSource>,
    /// None when artifacts failed to load at startup; /analyze then refuses.
    pub classifier: Option<Arc<ClassifierService>>,
    pub lang: String,
    pub country: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Play Store URL containing an `id=` parameter.
    pub url: String,
    /// Requested sample size (default 60).
    pub count: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub classifier_loaded: bool,
}

fn error_status(err: &AnalyzeError) -> StatusCode {
    match err {
        AnalyzeError::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        AnalyzeError::InvalidUrl => StatusCode::BAD_REQUEST,
        AnalyzeError::NoReviews => StatusCode::NOT_FOUND,
        AnalyzeError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(err: AnalyzeError) -> (StatusCode, Json<ErrorResponse>) {
    (
        error_status(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Analyze recent reviews for the app in the given Play Store URL.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Balanced sentiment sample", body = AnalysisResult),
        (status = 400, description = "URL has no extractable app id", body = ErrorResponse),
        (status = 404, description = "No reviews found for this app", body = ErrorResponse),
        (status = 500, description = "Review source or model failure", body = ErrorResponse),
        (status = 503, description = "Classifier artifacts not loaded", body = ErrorResponse)
    ),
    tag = "analysis"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, (StatusCode, Json<ErrorResponse>)> {
    // negative counts degrade to an empty (but well-defined) sample
    let target_count = req.count.unwrap_or(DEFAULT_TARGET_COUNT as i64).max(0) as usize;

    let classifier = state
        .classifier
        .as_ref()
        .ok_or_else(|| error_reply(AnalyzeError::Configuration))?;

    match analyzer::run_analysis(
        state.source.as_ref(),
        classifier.as_ref(),
        &req.url,
        target_count,
        &state.lang,
        &state.country,
    )
    .await
    {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            tracing::warn!(error = %err, "analysis failed");
            Err(error_reply(err))
        }
    }
}

/// Liveness plus classifier readiness.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse)),
    tag = "analysis"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        classifier_loaded: state.classifier.is_some(),
    })
}
