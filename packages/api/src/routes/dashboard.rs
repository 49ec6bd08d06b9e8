use axum::response::Html;

const DASHBOARD: &str = include_str!("../../assets/dashboard.html");

/// Static demo page; everything it shows comes from `POST /predict`
#[tracing::instrument(name = "GET /")]
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}
