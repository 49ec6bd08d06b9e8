use crate::measurement::Field;
use crate::model::ModelError;
use serde::Serialize;
use std::fmt;

/// Which rule a raw measurement broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Field absent or `null`
    Missing,
    /// Present but not a real number
    Type,
    /// A number outside `[0, 10]`, or not finite
    Range,
}

impl Constraint {
    pub fn message(&self) -> &'static str {
        match self {
            Constraint::Missing => "Field required",
            Constraint::Type => "Input should be a valid number",
            Constraint::Range => "Measurements must be between 0 and 10 cm",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Missing => write!(f, "missing"),
            Constraint::Type => write!(f, "type"),
            Constraint::Range => write!(f, "range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{}: {}", item_prefix(.item), .field, .constraint.message())]
pub struct FieldViolation {
    /// Position in a batch request, `None` for single requests
    pub item: Option<usize>,
    pub field: Field,
    pub constraint: Constraint,
}

impl FieldViolation {
    pub fn new(field: Field, constraint: Constraint) -> Self {
        Self {
            item: None,
            field,
            constraint,
        }
    }

    pub fn at_item(mut self, item: usize) -> Self {
        self.item = Some(item);
        self
    }
}

fn item_prefix(item: &Option<usize>) -> String {
    item.map(|i| format!("item {}: ", i)).unwrap_or_default()
}

/// Rejected input, carrying every offending field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid measurements: {}", join_violations(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The model collaborator failed; the message of the cause is kept as is
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct PredictionError {
    /// Position in a batch request, `None` for single requests
    pub item: Option<usize>,
    pub source: ModelError,
}

impl From<ModelError> for PredictionError {
    fn from(source: ModelError) -> Self {
        Self { item: None, source }
    }
}

/// Startup wiring errors: labels, model parameters, arity checks
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Class label list is empty")]
    EmptyLabels,

    #[error("Class label at position {0} is blank")]
    BlankLabel(usize),

    #[error("Duplicate class label: {0}")]
    DuplicateLabel(String),

    #[error("Model outputs {model} classes but {labels} class labels are configured")]
    ArityMismatch { model: usize, labels: usize },

    #[error("Model expects {model} features but measurements provide {expected}")]
    FeatureMismatch { model: usize, expected: usize },

    #[error("Invalid model parameters: {0}")]
    InvalidModel(String),

    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse model parameters: {0}")]
    Parse(#[from] serde_json::Error),
}
