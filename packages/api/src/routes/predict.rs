use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use petal::{BatchMode, PredictionResult, RawMeasurements, validate, validate_batch};
use serde::Deserialize;
use std::time::Instant;
use utoipa::IntoParams;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(predict))
        .route("/batch", post(predict_batch))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchQuery {
    /// `strict` (default) fails the whole batch on the first failing item,
    /// `partial` reports failures per item
    #[serde(default)]
    pub mode: BatchMode,
}

#[utoipa::path(
    post,
    path = "/predict",
    tag = "prediction",
    request_body = RawMeasurements,
    responses(
        (status = 200, description = "Predicted species with confidence and class probabilities", body = PredictionResult),
        (status = 422, description = "A measurement is missing, not a number or outside [0, 10]"),
        (status = 500, description = "The model failed"),
        (status = 503, description = "No model is loaded")
    )
)]
#[tracing::instrument(name = "POST /predict", skip(state, payload))]
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawMeasurements>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(raw) = payload.inspect_err(|_| metrics::record_failure("single", "validation"))?;
    let features = validate(&raw).inspect_err(|_| metrics::record_failure("single", "validation"))?;
    let predictor = state.predictor()?;

    let started = Instant::now();
    let result = predictor.predict(&features).map_err(|e| {
        metrics::record_failure("single", "model");
        ApiError::prediction_failed(format!("Prediction error: {}", e))
    })?;
    metrics::record_success("single", 1, started.elapsed());

    tracing::debug!(species = %result.species, confidence = result.confidence, "Prediction");
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/predict/batch",
    tag = "prediction",
    params(BatchQuery),
    request_body = Vec<RawMeasurements>,
    responses(
        (status = 200, description = "One prediction per input, in input order", body = petal::BatchResult),
        (status = 422, description = "An item failed validation (strict mode)"),
        (status = 500, description = "The model failed on an item (strict mode)"),
        (status = 503, description = "No model is loaded")
    )
)]
#[tracing::instrument(name = "POST /predict/batch", skip(state, query, payload))]
pub async fn predict_batch(
    State(state): State<AppState>,
    query: Result<Query<BatchQuery>, QueryRejection>,
    payload: Result<Json<Vec<RawMeasurements>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let Json(items) = payload.inspect_err(|_| metrics::record_failure("batch", "validation"))?;
    metrics::record_batch_size(items.len());

    match query.mode {
        BatchMode::Strict => {
            let features =
                validate_batch(&items).inspect_err(|_| metrics::record_failure("batch", "validation"))?;
            let predictor = state.predictor()?;

            let started = Instant::now();
            let batch = predictor.predict_batch(&features).map_err(|e| {
                metrics::record_failure("batch", "model");
                tracing::warn!(item = ?e.item, "Batch aborted");
                ApiError::prediction_failed(format!("Batch prediction error: {}", e))
            })?;
            metrics::record_success("batch", batch.predictions.len(), started.elapsed());

            Ok(Json(batch).into_response())
        }
        BatchMode::Partial => {
            let predictor = state.predictor()?;

            let started = Instant::now();
            let report = predictor.predict_each(&items);
            let failed = report.predictions.iter().filter(|e| e.is_failed()).count();
            if failed > 0 {
                metrics::record_failure("batch", "item");
            }
            metrics::record_success("batch", items.len() - failed, started.elapsed());

            Ok(Json(report).into_response())
        }
    }
}
