use axum::{Json, Router, routing::get};
use state::AppState;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use utoipa::OpenApi;

mod metrics;
mod routes;

pub mod error;
pub mod openapi;
pub mod state;

pub use axum;

pub fn construct_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .nest("/health", routes::health::routes())
        .nest("/predict", routes::predict::routes())
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

#[tracing::instrument(name = "GET /openapi.json")]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
