//! Prediction formatting: model output in, label + confidence + distribution out.

use crate::error::{ConfigError, PredictionError};
use crate::labels::ClassLabels;
use crate::measurement::{FeatureVector, Field, RawMeasurements, validate};
use crate::model::{Classifier, ModelError, argmax};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

/// Probability per class label, kept in configured label order.
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassProbabilities(Vec<(String, f64)>);

impl ClassProbabilities {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, p)| p).sum()
    }
}

impl FromIterator<(String, f64)> for ClassProbabilities {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, probability) in &self.0 {
            map.serialize_entry(name, probability)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionResult {
    /// Predicted class label
    pub species: String,
    /// Probability of the predicted label (0-1)
    pub confidence: f64,
    /// Probability for every configured label
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub probabilities: ClassProbabilities,
}

/// Strict batch answer: one result per input, input order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchResult {
    pub predictions: Vec<PredictionResult>,
}

/// How a batch reacts to a failing item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Any failing item fails the whole batch
    #[default]
    Strict,
    /// Failing items are reported in place, the rest still get predictions
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum BatchEntry {
    Prediction(PredictionResult),
    Failed { error: String },
}

impl BatchEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchEntry::Failed { .. })
    }
}

/// Partial batch answer: one entry per input, input order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchReport {
    pub predictions: Vec<BatchEntry>,
}

/// Holds the model and the label order it was trained with. Stateless
/// otherwise, so one instance serves every request.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Classifier>,
    labels: ClassLabels,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("n_classes", &self.model.n_classes())
            .field("labels", &self.labels)
            .finish()
    }
}

impl Predictor {
    /// Fails when the model's class count or feature count does not line up
    /// with the configured labels and the measurement layout.
    pub fn new(model: Arc<dyn Classifier>, labels: ClassLabels) -> Result<Self, ConfigError> {
        if model.n_features() != Field::COUNT {
            return Err(ConfigError::FeatureMismatch {
                model: model.n_features(),
                expected: Field::COUNT,
            });
        }
        if model.n_classes() != labels.len() {
            return Err(ConfigError::ArityMismatch {
                model: model.n_classes(),
                labels: labels.len(),
            });
        }
        Ok(Self { model, labels })
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
        Ok(self.score(features)?)
    }

    /// Scores every vector in order and stops at the first failure
    pub fn predict_batch(&self, vectors: &[FeatureVector]) -> Result<BatchResult, PredictionError> {
        let predictions = vectors
            .iter()
            .enumerate()
            .map(|(index, features)| {
                self.score(features).map_err(|source| PredictionError {
                    item: Some(index),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchResult { predictions })
    }

    /// Validates and scores every item on its own; failures stay in place
    pub fn predict_each(&self, items: &[RawMeasurements]) -> BatchReport {
        let predictions = items
            .iter()
            .enumerate()
            .map(|(index, raw)| match validate(raw) {
                Ok(features) => match self.score(&features) {
                    Ok(result) => BatchEntry::Prediction(result),
                    Err(err) => {
                        tracing::warn!(item = index, error = %err, "Batch item prediction failed");
                        BatchEntry::Failed {
                            error: format!("Prediction error: {}", err),
                        }
                    }
                },
                Err(err) => BatchEntry::Failed {
                    error: err.to_string(),
                },
            })
            .collect();
        BatchReport { predictions }
    }

    fn score(&self, features: &FeatureVector) -> Result<PredictionResult, ModelError> {
        let probabilities = self.model.classify_probabilities(features)?;
        if probabilities.len() != self.labels.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.labels.len(),
                actual: probabilities.len(),
            });
        }
        if let Some(index) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite(index));
        }

        let predicted = argmax(&probabilities).ok_or(ModelError::ShapeMismatch {
            expected: self.labels.len(),
            actual: 0,
        })?;

        let reported = self.model.classify(features)?;
        if reported != predicted {
            tracing::warn!(
                reported,
                predicted,
                "Model class index disagrees with its probabilities, using the argmax"
            );
        }

        let species = self.labels.as_slice()[predicted].clone();
        let confidence = probabilities[predicted];
        let probabilities = self
            .labels
            .iter()
            .map(str::to_string)
            .zip(probabilities)
            .collect();

        Ok(PredictionResult {
            species,
            confidence,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::gaussian_nb::GaussianNaiveBayes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed distribution and an optional fixed class index
    struct Stub {
        probabilities: Vec<f64>,
        class: Option<usize>,
    }

    impl Stub {
        fn new(probabilities: Vec<f64>) -> Self {
            Self {
                probabilities,
                class: None,
            }
        }
    }

    impl Classifier for Stub {
        fn n_features(&self) -> usize {
            4
        }

        fn n_classes(&self) -> usize {
            3
        }

        fn classify_probabilities(&self, _: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            Ok(self.probabilities.clone())
        }

        fn classify(&self, features: &FeatureVector) -> Result<usize, ModelError> {
            match self.class {
                Some(class) => Ok(class),
                None => argmax(&self.classify_probabilities(features)?)
                    .ok_or(ModelError::Internal("empty".to_string())),
            }
        }
    }

    /// Encodes the sepal length into the winning class, fails on petal width 9
    struct Echo {
        calls: AtomicUsize,
    }

    impl Classifier for Echo {
        fn n_features(&self) -> usize {
            4
        }

        fn n_classes(&self) -> usize {
            3
        }

        fn classify_probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let [sepal_length, _, _, petal_width] = features.values();
            if petal_width == 9.0 {
                return Err(ModelError::Internal("model exploded".to_string()));
            }
            let mut probabilities = vec![0.1, 0.1, 0.1];
            probabilities[sepal_length as usize % 3] = 0.8;
            Ok(probabilities)
        }
    }

    fn predictor(model: impl Classifier + 'static) -> Predictor {
        Predictor::new(Arc::new(model), ClassLabels::iris()).unwrap()
    }

    fn features(values: [f64; 4]) -> FeatureVector {
        FeatureVector::new(values[0], values[1], values[2], values[3]).unwrap()
    }

    #[test]
    fn builds_result_from_probabilities() {
        let result = predictor(Stub::new(vec![0.1, 0.7, 0.2]))
            .predict(&features([1.0; 4]))
            .unwrap();
        assert_eq!(result.species, "versicolor");
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.probabilities.get("setosa"), Some(0.1));
        assert_eq!(result.probabilities.get("virginica"), Some(0.2));
        assert_eq!(
            result.probabilities.labels().collect::<Vec<_>>(),
            vec!["setosa", "versicolor", "virginica"]
        );
    }

    #[test]
    fn ties_resolve_to_first_configured_label() {
        let result = predictor(Stub::new(vec![0.2, 0.4, 0.4]))
            .predict(&features([1.0; 4]))
            .unwrap();
        assert_eq!(result.species, "versicolor");
        assert_eq!(result.confidence, 0.4);

        let result = predictor(Stub::new(vec![0.5, 0.0, 0.5]))
            .predict(&features([1.0; 4]))
            .unwrap();
        assert_eq!(result.species, "setosa");
    }

    #[test]
    fn argmax_wins_over_a_disagreeing_class_index() {
        let stub = Stub {
            probabilities: vec![0.1, 0.2, 0.7],
            class: Some(0),
        };
        let result = predictor(stub).predict(&features([1.0; 4])).unwrap();
        assert_eq!(result.species, "virginica");
        assert_eq!(result.confidence, result.probabilities.get("virginica").unwrap());
    }

    #[test]
    fn wrong_arity_output_is_a_prediction_error() {
        let err = predictor(Stub::new(vec![0.5, 0.5]))
            .predict(&features([1.0; 4]))
            .unwrap_err();
        assert!(err.item.is_none());
        assert!(matches!(
            err.source,
            ModelError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn non_finite_output_is_a_prediction_error() {
        let err = predictor(Stub::new(vec![0.5, f64::NAN, 0.5]))
            .predict(&features([1.0; 4]))
            .unwrap_err();
        assert!(matches!(err.source, ModelError::NonFinite(1)));
    }

    #[test]
    fn label_arity_is_checked_at_construction() {
        let labels = ClassLabels::new(["a", "b"]).unwrap();
        let err = Predictor::new(Arc::new(Stub::new(vec![1.0, 0.0, 0.0])), labels).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ArityMismatch {
                model: 3,
                labels: 2
            }
        ));
    }

    #[test]
    fn batch_preserves_order() {
        let predictor = predictor(Echo {
            calls: AtomicUsize::new(0),
        });
        let batch = predictor
            .predict_batch(&[
                features([2.0, 1.0, 1.0, 1.0]),
                features([0.0, 1.0, 1.0, 1.0]),
                features([1.0, 1.0, 1.0, 1.0]),
            ])
            .unwrap();
        let species: Vec<_> = batch.predictions.iter().map(|p| p.species.as_str()).collect();
        assert_eq!(species, vec!["virginica", "setosa", "versicolor"]);
    }

    #[test]
    fn batch_fails_as_a_whole_on_first_model_error() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let predictor = Predictor::new(echo.clone(), ClassLabels::iris()).unwrap();
        let err = predictor
            .predict_batch(&[
                features([0.0, 1.0, 1.0, 1.0]),
                features([0.0, 1.0, 1.0, 9.0]),
                features([0.0, 1.0, 1.0, 1.0]),
            ])
            .unwrap_err();
        assert_eq!(err.item, Some(1));
        assert_eq!(err.to_string(), "model exploded");
        // item 0 twice (probabilities + class index), item 1 once, item 2 never
        assert_eq!(echo.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn partial_batch_reports_failures_in_place() {
        let predictor = predictor(Echo {
            calls: AtomicUsize::new(0),
        });
        let report = predictor.predict_each(&[
            RawMeasurements::from_values(1.0, 1.0, 1.0, 1.0),
            RawMeasurements::from_values(1.0, 1.0, 1.0, 9.0),
            RawMeasurements::from_values(1.0, 1.0, 11.0, 1.0),
            RawMeasurements::from_values(2.0, 1.0, 1.0, 1.0),
        ]);

        let failed: Vec<bool> = report.predictions.iter().map(BatchEntry::is_failed).collect();
        assert_eq!(failed, vec![false, true, true, false]);
        assert_eq!(
            report.predictions[1],
            BatchEntry::Failed {
                error: "Prediction error: model exploded".to_string()
            }
        );
        match &report.predictions[3] {
            BatchEntry::Prediction(result) => assert_eq!(result.species, "virginica"),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn reference_model_predicts_setosa() {
        let model = Arc::new(GaussianNaiveBayes::reference().unwrap());
        let predictor = Predictor::new(model, ClassLabels::iris()).unwrap();
        let result = predictor.predict(&features([5.1, 3.5, 1.4, 0.2])).unwrap();

        assert_eq!(result.species, "setosa");
        assert!(result.confidence > 0.9);
        assert_eq!(result.confidence, result.probabilities.get("setosa").unwrap());
        assert_eq!(result.probabilities.len(), 3);
        assert!((result.probabilities.total() - 1.0).abs() < 1e-6);
        assert!(result.probabilities.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn probabilities_serialize_in_label_order() {
        let result = predictor(Stub::new(vec![0.1, 0.7, 0.2]))
            .predict(&features([1.0; 4]))
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"species":"versicolor","confidence":0.7,"probabilities":{"setosa":0.1,"versicolor":0.7,"virginica":0.2}}"#
        );
    }
}
