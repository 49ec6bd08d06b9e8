use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() -> Result<(), BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("prediction_duration_seconds".to_string()),
            &[0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1],
        )?
        .set_buckets_for_metric(
            Matcher::Full("prediction_batch_size".to_string()),
            &[1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 500.0],
        )?
        .install_recorder()?;

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus recorder already initialized");
    }

    metrics::describe_counter!("predictions_total", "Number of successfully scored inputs");
    metrics::describe_counter!("prediction_errors_total", "Number of failed prediction requests");
    metrics::describe_histogram!(
        "prediction_duration_seconds",
        "Time spent in the model per request in seconds"
    );
    metrics::describe_histogram!("prediction_batch_size", "Items per batch request");

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

pub async fn handler() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
