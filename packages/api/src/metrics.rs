//! Prediction counters. No-ops until the binary installs a recorder.

use std::time::Duration;

pub(crate) fn record_success(route: &'static str, items: usize, elapsed: Duration) {
    metrics::counter!("predictions_total", "route" => route).increment(items as u64);
    metrics::histogram!("prediction_duration_seconds", "route" => route)
        .record(elapsed.as_secs_f64());
}

pub(crate) fn record_failure(route: &'static str, stage: &'static str) {
    metrics::counter!("prediction_errors_total", "route" => route, "stage" => stage).increment(1);
}

pub(crate) fn record_batch_size(items: usize) {
    metrics::histogram!("prediction_batch_size").record(items as f64);
}
