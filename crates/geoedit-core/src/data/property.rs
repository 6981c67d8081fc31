//! Feature identifiers and scalar property values.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Property map of a canonical feature, keyed by column name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Name of the property that mirrors the feature-level id.
pub const ID_PROPERTY: &str = "id";

/// Name of the synthetic property describing the geometry kind.
pub const GEOMETRY_TYPE_PROPERTY: &str = "geometryType";

/// Stable identifier of a canonical feature.
///
/// GeoJSON allows both numeric and string ids. Integer ids are what the
/// normalizer assigns; string ids are kept verbatim from the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    /// Integer id (`1`, `2`, ...).
    Int(i64),
    /// Free-form string id.
    Str(String),
}

impl FeatureId {
    /// Reads an id from a JSON value. Empty strings, booleans, arrays and
    /// objects are not ids.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FeatureId::Int(i))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        Some(FeatureId::Int(f as i64))
                    } else {
                        Some(FeatureId::Str(n.to_string()))
                    }
                }
            }
            Value::String(s) if !s.trim().is_empty() => Some(FeatureId::Str(s.clone())),
            _ => None,
        }
    }

    /// Reads an id from a property value.
    pub fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Number(n) => FeatureId::from_json(&Value::Number(n.clone())),
            PropertyValue::String(s) if !s.trim().is_empty() => Some(FeatureId::Str(s.clone())),
            _ => None,
        }
    }

    /// Returns the integer value of this id, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FeatureId::Int(i) => Some(*i),
            FeatureId::Str(_) => None,
        }
    }

    /// The property value that mirrors this id in `properties.id`.
    pub fn to_property(&self) -> PropertyValue {
        match self {
            FeatureId::Int(i) => PropertyValue::from(*i),
            FeatureId::Str(s) => PropertyValue::String(s.clone()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Int(i) => write!(f, "{}", i),
            FeatureId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        FeatureId::Int(value)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        FeatureId::Str(value.to_string())
    }
}

/// Scalar value of a feature property.
///
/// Nested JSON (arrays, objects) is flattened to its JSON text at ingestion.
/// Numbers keep their JSON representation so integer columns stay integers
/// on export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl PropertyValue {
    /// Coerces an arbitrary JSON value into a scalar property.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => PropertyValue::Number(n.clone()),
            Value::String(s) => PropertyValue::String(s.clone()),
            other => PropertyValue::String(other.to_string()),
        }
    }

    /// Dynamic typing for untyped text cells (CSV fields).
    ///
    /// Empty text is null, `true`/`false` are booleans, anything that parses
    /// as a finite number is a number, everything else stays text.
    pub fn infer(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return PropertyValue::Null;
        }
        match trimmed {
            "true" | "TRUE" | "True" => return PropertyValue::Bool(true),
            "false" | "FALSE" | "False" => return PropertyValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return PropertyValue::from(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return PropertyValue::Number(n);
            }
        }
        PropertyValue::String(text.to_string())
    }

    /// Converts committed cell text into a value, keeping the scalar kind of
    /// `previous` when the text parses as that kind.
    pub fn from_edit(previous: Option<&PropertyValue>, text: &str) -> Self {
        match previous {
            Some(PropertyValue::Number(_)) => {
                let trimmed = text.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return PropertyValue::from(i);
                }
                if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                    return PropertyValue::Number(n);
                }
                PropertyValue::String(text.to_string())
            }
            Some(PropertyValue::Bool(_)) => match text.trim() {
                "true" => PropertyValue::Bool(true),
                "false" => PropertyValue::Bool(false),
                _ => PropertyValue::String(text.to_string()),
            },
            Some(PropertyValue::Null) if text.is_empty() => PropertyValue::Null,
            _ => PropertyValue::String(text.to_string()),
        }
    }

    /// Numeric view of the value; numeric strings count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => n.as_f64(),
            PropertyValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Returns the string content if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Builds a number value from a float; non-finite floats become null.
    pub fn from_f64(value: f64) -> Self {
        Number::from_f64(value)
            .map(PropertyValue::Number)
            .unwrap_or(PropertyValue::Null)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => Ok(()),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(Number::from(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}
