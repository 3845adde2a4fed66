//! HTTP JSON API: raw-input source and result sink for browser / service clients.
//!
//! - `GET  /health`  runner state and loaded model details (503 until Ready)
//! - `GET  /healthz` liveness probe
//! - `GET  /schema`  feature layout
//! - `GET  /metrics` Prometheus counters
//! - `POST /predict` `RawInput` JSON -> prediction or typed error

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::encoding::{FeatureSlot, RawInput};
use crate::error::{ErrorCategory, Result, WagecastError};
use crate::inference::{ModelInfo, RunnerState};
use crate::predictor::Predictor;
use crate::services::PredictionMetrics;

/// Shared state for API handlers
pub struct ApiState {
    pub predictor: Arc<Predictor>,
    pub metrics: PredictionMetrics,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self {
            predictor,
            metrics: PredictionMetrics::default(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: RunnerState,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub model_path: String,
    pub feature_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub request_id: Uuid,
    pub prediction: f32,
    pub output: String,
    pub used_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub category: ErrorCategory,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub request_id: Uuid,
    pub error: ErrorBody,
}

/// Typed error with a stable status per category.
pub struct ApiError {
    request_id: Uuid,
    error: WagecastError,
}

pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::NotReady | ErrorCategory::LoadFailed => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::BackendFault => StatusCode::BAD_GATEWAY,
        ErrorCategory::PipelineDefect
        | ErrorCategory::Configuration
        | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let category = self.error.category();
        let body = ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                category,
                message: self.error.to_string(),
            },
        };
        (status_for(category), Json(body)).into_response()
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/schema", get(schema_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(predict_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(state: Arc<ApiState>, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| WagecastError::Internal(format!("API server error: {}", e)))?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let runner = state.predictor.runner();
    let status = runner.state();
    let health = HealthResponse {
        status,
        timestamp: Utc::now(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds().max(0) as u64,
        model_path: state.predictor.model_path().to_string(),
        feature_count: state.predictor.encoder().feature_count(),
        model: runner.model_info().await,
        failure: runner.failure_reason().await,
    };
    let status_code = if status.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(health))
}

async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn schema_handler(State(state): State<Arc<ApiState>>) -> Json<Vec<FeatureSlot>> {
    Json(state.predictor.encoder().schema().layout())
}

async fn metrics_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let ready = if state.predictor.runner().state().is_ready() {
        1
    } else {
        0
    };
    state.metrics.render_prometheus(ready)
}

async fn predict_handler(
    State(state): State<Arc<ApiState>>,
    body: std::result::Result<Json<RawInput>, JsonRejection>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);

    async move {
        let outcome = match body {
            Ok(Json(input)) => state.predictor.predict(&input).await,
            Err(rejection) => Err(WagecastError::InvalidInput(rejection.body_text())),
        };
        state.metrics.record(&outcome);

        match outcome {
            Ok(result) => {
                info!(prediction = result.value, "prediction served");
                Ok(Json(PredictResponse {
                    request_id,
                    prediction: result.value,
                    output: result.output,
                    used_fallback: result.used_fallback,
                }))
            }
            Err(error) => Err(ApiError { request_id, error }),
        }
    }
    .instrument(span)
    .await
}
