use crate::error::ConfigError;
use std::collections::HashSet;

/// Class names of the bundled iris model, in model output order
pub const IRIS_CLASSES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Ordered class names; position `i` names model output index `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels(Vec<String>);

impl ClassLabels {
    pub fn new<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ConfigError::EmptyLabels);
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for (position, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(ConfigError::BlankLabel(position));
            }
            if !seen.insert(label.as_str()) {
                return Err(ConfigError::DuplicateLabel(label.clone()));
            }
        }

        Ok(Self(labels))
    }

    /// Parses a comma separated list, e.g. `setosa,versicolor,virginica`
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn iris() -> Self {
        Self(IRIS_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self::iris()
    }
}
