#[cfg(not(any(all(target_os = "macos", target_arch = "aarch64"), target_os = "ios")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, routing::get};
use dotenv::dotenv;
use petal::Predictor;
use petal_api::{construct_router, state::State};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Petal classification API");

    let config = config::Config::from_env()?;
    tracing::info!(
        "Loaded configuration: port={}, labels={:?}, metrics={}",
        config.port,
        config.class_labels.as_slice(),
        config.metrics_enabled
    );

    let model = config.load_model()?;
    let predictor = Predictor::new(model, config.class_labels.clone())?;
    tracing::info!("Model loaded: {:?}", predictor);

    let state = Arc::new(State::new(predictor));

    let mut app = Router::new().merge(construct_router(state));
    if config.metrics_enabled {
        metrics::init_metrics()?;
        app = app.route("/metrics", get(metrics::handler));
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
