//! Identity normalization for employee and manager references.
//!
//! Every comparison between identifiers goes through [`normalize`]. Raw
//! values are never compared directly: `5`, `"5"` and `" 5 "` all name the
//! same employee.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw cell value as it arrives from an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl RawValue {
    /// Convert a JSON value into a raw cell. `null`, arrays and objects carry
    /// no usable scalar and map to `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(RawValue::Text(s.clone())),
            serde_json::Value::Number(n) => Some(RawValue::Number(n.clone())),
            serde_json::Value::Bool(b) => Some(RawValue::Bool(*b)),
            _ => None,
        }
    }

    /// Best-effort numeric reading used for FTE values.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Number(n) => n.as_f64()?,
            RawValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// True for text cells that are empty after trimming.
    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::Number(n) => write!(f, "{}", format_number(n)),
            RawValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(RawValue::Number)
            .unwrap_or_else(|| RawValue::Text(value.to_string()))
    }
}

/// Integral floats render without a fractional part so `5.0` and `5` agree.
fn format_number(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// Canonical identity key for a raw identifier.
///
/// `None` normalizes to the empty string, which means "no manager" and is
/// never a valid employee id.
pub fn normalize(raw: Option<&RawValue>) -> String {
    match raw {
        Some(value) => value.to_string().trim().to_string(),
        None => String::new(),
    }
}
