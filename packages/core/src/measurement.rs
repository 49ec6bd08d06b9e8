//! Input validation: raw request fields in, bounded [`FeatureVector`] out.

use crate::error::{Constraint, FieldViolation, ValidationError};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inclusive lower bound for every measurement (cm)
pub const MIN_MEASUREMENT: f64 = 0.0;
/// Inclusive upper bound for every measurement (cm)
pub const MAX_MEASUREMENT: f64 = 10.0;

/// The four measured fields, in the order the model was trained with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::SepalLength,
        Field::SepalWidth,
        Field::PetalLength,
        Field::PetalWidth,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn name(&self) -> &'static str {
        match self {
            Field::SepalLength => "sepal_length",
            Field::SepalWidth => "sepal_width",
            Field::PetalLength => "petal_length",
            Field::PetalWidth => "petal_width",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single length or width in `[0, 10]` cm
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Measurement(f64);

impl Measurement {
    pub fn new(value: f64) -> Result<Self, Constraint> {
        if !(MIN_MEASUREMENT..=MAX_MEASUREMENT).contains(&value) {
            return Err(Constraint::Range);
        }
        // -0.0 == 0.0, store the positive zero
        if value == 0.0 {
            return Ok(Self(0.0));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Validated model input, ordered as [`Field::ALL`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([Measurement; Field::COUNT]);

impl FeatureVector {
    /// Validates four plain numbers in field order
    pub fn new(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> Result<Self, ValidationError> {
        let raw = [sepal_length, sepal_width, petal_length, petal_width];
        Self::collect(|field| Measurement::new(raw[field.index()]))
    }

    /// Checks every field, so the error lists all offending fields
    fn collect(
        mut check: impl FnMut(Field) -> Result<Measurement, Constraint>,
    ) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();
        let mut measurements = [Measurement(0.0); Field::COUNT];
        for field in Field::ALL {
            match check(field) {
                Ok(m) => measurements[field.index()] = m,
                Err(constraint) => violations.push(FieldViolation::new(field, constraint)),
            }
        }
        if violations.is_empty() {
            Ok(Self(measurements))
        } else {
            Err(ValidationError::new(violations))
        }
    }

    pub fn get(&self, field: Field) -> Measurement {
        self.0[field.index()]
    }

    pub fn values(&self) -> [f64; Field::COUNT] {
        self.0.map(|m| m.value())
    }
}

/// Request body as received. Fields stay untyped so that a missing value,
/// a non-number and an out-of-range number are reported differently.
/// Only a JSON object is accepted; positional arrays are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RawMeasurements {
    /// Sepal length in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, minimum = 0.0, maximum = 10.0))]
    pub sepal_length: Option<Value>,
    /// Sepal width in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, minimum = 0.0, maximum = 10.0))]
    pub sepal_width: Option<Value>,
    /// Petal length in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, minimum = 0.0, maximum = 10.0))]
    pub petal_length: Option<Value>,
    /// Petal width in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, minimum = 0.0, maximum = 10.0))]
    pub petal_width: Option<Value>,
}

impl RawMeasurements {
    pub fn from_values(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> Self {
        Self {
            sepal_length: Some(Value::from(sepal_length)),
            sepal_width: Some(Value::from(sepal_width)),
            petal_length: Some(Value::from(petal_length)),
            petal_width: Some(Value::from(petal_width)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        match field {
            Field::SepalLength => self.sepal_length.as_ref(),
            Field::SepalWidth => self.sepal_width.as_ref(),
            Field::PetalLength => self.petal_length.as_ref(),
            Field::PetalWidth => self.petal_width.as_ref(),
        }
    }
}

impl<'de> Deserialize<'de> for RawMeasurements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawMeasurementsVisitor)
    }
}

struct RawMeasurementsVisitor;

impl<'de> Visitor<'de> for RawMeasurementsVisitor {
    type Value = RawMeasurements;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of measurements")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut raw = RawMeasurements::default();
        while let Some(key) = map.next_key::<String>()? {
            let value: Value = map.next_value()?;
            let slot = match key.as_str() {
                "sepal_length" => &mut raw.sepal_length,
                "sepal_width" => &mut raw.sepal_width,
                "petal_length" => &mut raw.petal_length,
                "petal_width" => &mut raw.petal_width,
                _ => continue,
            };
            if slot.is_some() {
                return Err(de::Error::custom(format_args!("duplicate field `{}`", key)));
            }
            *slot = Some(value);
        }
        Ok(raw)
    }
}

fn coerce(value: Option<&Value>) -> Result<f64, Constraint> {
    match value {
        None | Some(Value::Null) => Err(Constraint::Missing),
        Some(Value::Number(n)) => n.as_f64().ok_or(Constraint::Type),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| Constraint::Type),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(_) => Err(Constraint::Type),
    }
}

/// Validates one request body. Every field is checked, so the error lists all
/// offending fields rather than only the first.
pub fn validate(raw: &RawMeasurements) -> Result<FeatureVector, ValidationError> {
    FeatureVector::collect(|field| coerce(raw.get(field)).and_then(Measurement::new))
}

/// Validates a batch. Any invalid item rejects the whole batch; the error
/// carries the violations of every invalid item, tagged with its index.
pub fn validate_batch(items: &[RawMeasurements]) -> Result<Vec<FeatureVector>, ValidationError> {
    let mut vectors = Vec::with_capacity(items.len());
    let mut violations = Vec::new();

    for (index, raw) in items.iter().enumerate() {
        match validate(raw) {
            Ok(vector) => vectors.push(vector),
            Err(err) => violations.extend(
                err.into_violations()
                    .into_iter()
                    .map(|violation| violation.at_item(index)),
            ),
        }
    }

    if violations.is_empty() {
        Ok(vectors)
    } else {
        Err(ValidationError::new(violations))
    }
}
