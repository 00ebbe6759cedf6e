//! Observations returned by source adapters

use crate::propagation::clamp_unit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value reported for a logical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric quantity (price, ratio, count)
    Number(f64),
    /// Categorical value (rating, recommendation, disclosure text)
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, if it is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Text view of the value, if it is categorical
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// How values of a field are compared during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Quoted price; compared with the price tolerance
    PriceLike,
    /// Other numeric quantity; compared with the numeric tolerance
    Numeric,
    /// Categorical value; compared by exact match
    Categorical,
}

/// A field requested from the adapters for one discovery run
///
/// A name ending in `.*` requests every field under that prefix, e.g.
/// `risk.*` matches `risk.rates.probability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequest {
    /// Logical field name or `prefix.*` pattern
    pub name: String,
    /// Comparison rule
    pub kind: FieldKind,
}

impl FieldRequest {
    /// Create a field request
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Whether a reported field satisfies this request
    pub fn matches(&self, field: &str) -> bool {
        match self.name.strip_suffix('*') {
            Some(prefix) if prefix.ends_with('.') => {
                field.len() > prefix.len() && field.starts_with(prefix)
            }
            _ => self.name == field,
        }
    }
}

/// A single reported value from one adapter
///
/// Immutable once created: all fields are private and only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    field: String,
    value: FieldValue,
    source: String,
    observed_at: DateTime<Utc>,
    confidence: f64,
}

impl Observation {
    /// Create an observation; confidence is clamped into [0, 1]
    pub fn new(
        field: impl Into<String>,
        value: impl Into<FieldValue>,
        source: impl Into<String>,
        observed_at: DateTime<Utc>,
        confidence: f64,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            source: source.into(),
            observed_at,
            confidence: clamp_unit(confidence),
        }
    }

    /// Logical field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Reported value
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Adapter that reported the value
    pub fn source(&self) -> &str {
        &self.source
    }

    /// When the provider last refreshed the value
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Adapter-reported reliability of this value
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Copy of this observation with a different confidence
    pub fn with_confidence(&self, confidence: f64) -> Self {
        Self {
            confidence: clamp_unit(confidence),
            ..self.clone()
        }
    }
}
