use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Iris Flower Classification API",
        version = "1.0.0",
        description = "A machine learning API to classify Iris flowers based on their measurements.\n\nAll measurements are in centimeters and must lie in `[0, 10]`."
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "prediction", description = "Single and batch species prediction")
    ),
    paths(
        crate::routes::health::health,
        crate::routes::predict::predict,
        crate::routes::predict::predict_batch,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        petal::RawMeasurements,
        petal::PredictionResult,
        petal::BatchResult,
        petal::BatchReport,
        petal::BatchEntry,
        petal::BatchMode,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/health"));
        assert!(paths.contains(&"/predict"));
        assert!(paths.contains(&"/predict/batch"));
        assert_eq!(doc.info.title, "Iris Flower Classification API");
    }
}
