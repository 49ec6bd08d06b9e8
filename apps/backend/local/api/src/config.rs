use petal::{ClassLabels, Classifier, GaussianNaiveBayes};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Gaussian naive Bayes parameter file; the bundled iris model when unset
    pub model_path: Option<PathBuf>,
    /// Label for each model output index, in order
    pub class_labels: ClassLabels,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
            model_path: env::var("MODEL_PATH").ok().map(PathBuf::from),
            class_labels: match env::var("CLASS_LABELS") {
                Ok(list) => ClassLabels::parse(&list).map_err(|e| {
                    ConfigError::InvalidValue(format!("CLASS_LABELS ({})", e))
                })?,
                Err(_) => ClassLabels::iris(),
            },
            metrics_enabled: env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }

    pub fn load_model(&self) -> Result<Arc<dyn Classifier>, petal::ConfigError> {
        let model = match &self.model_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading model parameters");
                GaussianNaiveBayes::from_path(path)?
            }
            None => {
                tracing::info!("Loading bundled iris model");
                GaussianNaiveBayes::reference()?
            }
        };
        Ok(Arc::new(model))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model_path: Option<PathBuf>) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_path,
            class_labels: ClassLabels::iris(),
            metrics_enabled: false,
        }
    }

    #[test]
    fn loads_bundled_model_by_default() {
        let model = config(None).load_model().unwrap();
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.n_features(), 4);
    }

    #[test]
    fn missing_model_file_fails_startup() {
        let err = config(Some(PathBuf::from("/nonexistent/model.json")))
            .load_model()
            .err()
            .unwrap();
        assert!(matches!(err, petal::ConfigError::Io { .. }));
    }
}
