//! Gaussian naive Bayes over fitted per-class parameters.
//!
//! Parameters are stored as JSON (`priors`, `means`, `variances`); the bundled
//! file holds a fit on the classic three-class iris data with classes in the
//! order setosa, versicolor, virginica.

use super::{Classifier, ModelError};
use crate::error::ConfigError;
use crate::measurement::FeatureVector;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

const REFERENCE_PARAMS: &str = include_str!("../../models/iris_gaussian_nb.json");

/// Serialized form of a fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNbParams {
    /// Class prior probabilities
    pub priors: Vec<f64>,
    /// Per-class feature means (`n_classes` rows of `n_features`)
    pub means: Vec<Vec<f64>>,
    /// Per-class feature variances, same shape as `means`
    pub variances: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct GaussianNaiveBayes {
    log_priors: Array1<f64>,
    means: Array2<f64>,
    variances: Array2<f64>,
    /// `-0.5 * sum(ln(2 * pi * var))` per class
    log_norm: Array1<f64>,
}

impl GaussianNaiveBayes {
    /// The bundled iris model
    pub fn reference() -> Result<Self, ConfigError> {
        Self::from_json_slice(REFERENCE_PARAMS.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let params: GaussianNbParams = serde_json::from_slice(bytes)?;
        Self::from_params(params)
    }

    pub fn from_params(params: GaussianNbParams) -> Result<Self, ConfigError> {
        let n_classes = params.priors.len();
        if n_classes == 0 {
            return Err(ConfigError::InvalidModel("no classes".to_string()));
        }
        if params.means.len() != n_classes || params.variances.len() != n_classes {
            return Err(ConfigError::InvalidModel(format!(
                "{} priors, {} mean rows, {} variance rows",
                n_classes,
                params.means.len(),
                params.variances.len()
            )));
        }

        let n_features = params.means[0].len();
        if n_features == 0 {
            return Err(ConfigError::InvalidModel("no features".to_string()));
        }
        let ragged = params
            .means
            .iter()
            .chain(params.variances.iter())
            .any(|row| row.len() != n_features);
        if ragged {
            return Err(ConfigError::InvalidModel(format!(
                "every mean and variance row must hold {} values",
                n_features
            )));
        }

        if let Some(prior) = params
            .priors
            .iter()
            .find(|p| !p.is_finite() || **p <= 0.0)
        {
            return Err(ConfigError::InvalidModel(format!(
                "class priors must be positive, got {}",
                prior
            )));
        }
        if params.means.iter().flatten().any(|m| !m.is_finite()) {
            return Err(ConfigError::InvalidModel(
                "means must be finite".to_string(),
            ));
        }
        if let Some(var) = params
            .variances
            .iter()
            .flatten()
            .find(|v| !v.is_finite() || **v <= 0.0)
        {
            return Err(ConfigError::InvalidModel(format!(
                "variances must be positive, got {}",
                var
            )));
        }

        let means = Array2::from_shape_vec((n_classes, n_features), params.means.concat())
            .map_err(|e| ConfigError::InvalidModel(e.to_string()))?;
        let variances =
            Array2::from_shape_vec((n_classes, n_features), params.variances.concat())
                .map_err(|e| ConfigError::InvalidModel(e.to_string()))?;

        let log_priors = Array1::from(params.priors).mapv(f64::ln);
        let log_norm = variances
            .mapv(|v| (2.0 * PI * v).ln())
            .sum_axis(Axis(1))
            .mapv(|s| -0.5 * s);

        Ok(Self {
            log_priors,
            means,
            variances,
            log_norm,
        })
    }

    fn joint_log_likelihood(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let diff = &self.means - &x;
        let mahalanobis = ((&diff * &diff) / &self.variances).sum_axis(Axis(1));
        &self.log_priors + &self.log_norm - mahalanobis.mapv(|d| 0.5 * d)
    }
}

impl Classifier for GaussianNaiveBayes {
    fn n_features(&self) -> usize {
        self.means.ncols()
    }

    fn n_classes(&self) -> usize {
        self.means.nrows()
    }

    fn classify_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let values = features.values();
        if values.len() != self.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features(),
                actual: values.len(),
            });
        }

        let jll = self.joint_log_likelihood(ArrayView1::from(&values[..]));

        // log-sum-exp, shifted by the max for stability
        let max = jll.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        if !max.is_finite() {
            return Err(ModelError::Internal(
                "joint log-likelihood is not finite".to_string(),
            ));
        }
        let exp = jll.mapv(|v| (v - max).exp());
        let total = exp.sum();
        Ok((exp / total).to_vec())
    }
}
