//! Petal core
//!
//! Turns four raw flower measurements into a typed [`FeatureVector`], hands it
//! to a [`Classifier`] and shapes the answer into a [`PredictionResult`]:
//! predicted label, confidence and the full per-class distribution.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use petal::{ClassLabels, GaussianNaiveBayes, Predictor, validate};
//! use std::sync::Arc;
//!
//! let model = Arc::new(GaussianNaiveBayes::reference()?);
//! let predictor = Predictor::new(model, ClassLabels::iris())?;
//! let features = validate(&raw)?;
//! let result = predictor.predict(&features)?;
//! ```

pub mod error;
pub mod labels;
pub mod measurement;
pub mod model;
pub mod prediction;

pub use error::{ConfigError, Constraint, FieldViolation, PredictionError, ValidationError};
pub use labels::ClassLabels;
pub use measurement::{FeatureVector, Field, Measurement, RawMeasurements, validate, validate_batch};
pub use model::gaussian_nb::{GaussianNaiveBayes, GaussianNbParams};
pub use model::{Classifier, ModelError, argmax};
pub use prediction::{
    BatchEntry, BatchMode, BatchReport, BatchResult, ClassProbabilities, PredictionResult,
    Predictor,
};
