//! HTTP façade for the scoring service.
//!
//! Routes:
//! - `GET /` static liveness message
//! - `GET /health` readiness (503 until a model is loaded)
//! - `GET /metrics` request counters and latency
//! - `POST /predict` validate, score, threshold

use crate::error::ScoringError;
use crate::metrics::ScoringMetrics;
use crate::models::inference::{ModelInfo, ScoringService};
use crate::types::application::{FieldError, LoanApplication};
use crate::types::prediction::{DecisionPolicy, PredictionResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Payload of `GET /`
pub const LIVENESS_MESSAGE: &str = "Credit Scoring API is online. Use /predict to score clients.";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub scoring: Arc<ScoringService>,
    pub policy: DecisionPolicy,
    pub metrics: Arc<ScoringMetrics>,
}

impl AppState {
    pub fn new(scoring: ScoringService, policy: DecisionPolicy) -> Self {
        Self {
            scoring: Arc::new(scoring),
            policy,
            metrics: Arc::new(ScoringMetrics::new()),
        }
    }
}

/// Errors surfaced by the façade
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed schema validation
    Validation(Vec<FieldError>),
    /// The scoring service failed
    Scoring(ScoringError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
            ApiError::Scoring(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": e.to_string() })),
            )
                .into_response(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model_loaded: bool,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict))
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": LIVENESS_MESSAGE }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let model = state.scoring.model_info();
    let ready = model.is_some();
    let status = HealthStatus {
        status: if ready { "ready" } else { "not_ready" },
        model_loaded: ready,
        threshold: state.policy.threshold(),
        model,
    };
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let application = LoanApplication::from_json_bytes(&body).map_err(|errors| {
        state.metrics.record_validation_failure();
        debug!(
            request_id = %request_id,
            errors = errors.len(),
            "Rejected invalid application"
        );
        ApiError::Validation(errors)
    })?;

    let probability = state.scoring.predict(&application).map_err(|e| {
        state.metrics.record_scoring_failure();
        if e.is_unavailable() {
            warn!(request_id = %request_id, error = %e, "Scoring requested without a usable model");
        } else {
            error!(request_id = %request_id, error = %e, "Scoring failed");
        }
        ApiError::Scoring(e)
    })?;

    let response = state.policy.decide(probability);
    let latency = start.elapsed();
    state
        .metrics
        .record_prediction(latency, probability, response.decision);

    info!(
        request_id = %request_id,
        default_probability = response.default_probability,
        risk_class = response.risk_class,
        decision = response.decision.as_str(),
        latency_us = latency.as_micros() as u64,
        "Application scored"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loader::tests::tiny_forest;
    use crate::models::loader::ModelArtifact;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn unloaded_state() -> AppState {
        AppState::new(ScoringService::new(), DecisionPolicy::default())
    }

    fn loaded_state() -> AppState {
        let service = ScoringService::from_artifact(ModelArtifact::new(tiny_forest(7))).unwrap();
        AppState::new(service, DecisionPolicy::default())
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_predict(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const GOOD_CLIENT: &str = r#"{"age": 45, "income": 80000, "years_employed": 10,
        "credit_limit": 50000, "credit_utilization": 0.1, "delinquencies_2y": 0,
        "loan_amount": 10000}"#;

    #[tokio::test]
    async fn test_root() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(unloaded_state(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": LIVENESS_MESSAGE }));
    }

    #[tokio::test]
    async fn test_health_reports_readiness() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(unloaded_state(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(loaded_state(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["model"]["trees"], 3);
    }

    #[tokio::test]
    async fn test_predict_without_model_is_server_error() {
        let (status, body) = send(unloaded_state(), post_predict(GOOD_CLIENT)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Model not loaded");
    }

    #[tokio::test]
    async fn test_validation_error_never_reaches_scoring() {
        let state = unloaded_state();
        let metrics = state.metrics.clone();

        let (status, body) = send(state, post_predict(r#"{"age": 150, "income": -500}"#)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 7);
        assert_eq!(detail[0]["loc"], json!(["body", "age"]));
        assert_eq!(detail[1]["loc"], json!(["body", "income"]));
        assert_eq!(metrics.validation_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.scoring_failures.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_unprocessable() {
        let (status, body) = send(unloaded_state(), post_predict("{\"age\": ")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["type"], "json_invalid");
    }

    #[tokio::test]
    async fn test_predict_response_shape() {
        let state = loaded_state();
        let metrics = state.metrics.clone();
        let (status, body) = send(state, post_predict(GOOD_CLIENT)).await;

        assert_eq!(status, StatusCode::OK);
        let p = body["default_probability"].as_f64().unwrap();
        let risk_class = body["risk_class"].as_u64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(risk_class, u64::from(p > 0.35));
        let expected = if risk_class == 1 { "Rejected" } else { "Approved" };
        assert_eq!(body["decision"], expected);
        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let request = Request::get("/metrics").body(Body::empty()).unwrap();
        let (status, body) = send(unloaded_state(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["predictions"], 0);
    }
}
