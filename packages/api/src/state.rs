use crate::error::ApiError;
use petal::Predictor;
use std::sync::Arc;

pub type AppState = Arc<State>;

/// Process-wide, read-only after startup
#[derive(Debug, Default)]
pub struct State {
    predictor: Option<Arc<Predictor>>,
}

impl State {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Some(Arc::new(predictor)),
        }
    }

    /// Serving without a model: health answers, predictions get 503
    pub fn without_model() -> Self {
        Self { predictor: None }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn predictor(&self) -> Result<&Predictor, ApiError> {
        self.predictor
            .as_deref()
            .ok_or_else(|| ApiError::service_unavailable("Model is not loaded"))
    }
}
