//! The model collaborator seam.
//!
//! The service never trains anything; it only needs something that maps a
//! [`FeatureVector`] to a probability per class index.

use crate::measurement::FeatureVector;

pub mod gaussian_nb;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("non-finite probability at class index {0}")]
    NonFinite(usize),

    #[error("{0}")]
    Internal(String),
}

/// A trained probabilistic classifier.
///
/// Implementations are shared across request handlers, so they must be safe
/// for concurrent reads and deterministic for identical input.
pub trait Classifier: Send + Sync {
    /// Number of input features the model was trained on
    fn n_features(&self) -> usize;

    /// Number of classes, i.e. the length of every probability vector
    fn n_classes(&self) -> usize;

    /// One probability per class index, summing to 1
    fn classify_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;

    /// Index of the predicted class
    fn classify(&self, features: &FeatureVector) -> Result<usize, ModelError> {
        let probabilities = self.classify_probabilities(features)?;
        argmax(&probabilities).ok_or(ModelError::ShapeMismatch {
            expected: self.n_classes(),
            actual: 0,
        })
    }
}

/// Index of the largest value. Ties go to the lowest index; `None` when empty.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.9]), Some(0));
    }

    #[test]
    fn argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
    }

    #[test]
    fn argmax_of_empty_is_none() {
        assert_eq!(argmax(&[]), None);
    }
}
