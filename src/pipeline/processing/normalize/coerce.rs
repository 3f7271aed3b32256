//! Loose-to-strict value conversion. Nothing here fails loudly: callers get a
//! `ConversionFailure` describing what was found and fall back to a default.

use serde_json::Value;
use std::fmt;

/// A value could not be read as the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionFailure {
    pub found: ValueKind,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to an integer", self.found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueKind::Text,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a JSON value to an integer.
///
/// Integers pass through. Finite floats truncate toward zero. Text must hold a
/// base-10 integer, optionally signed and padded with whitespace, so `"1850"`
/// converts but `"1850.5"` and `"abc"` do not. Booleans, objects, arrays and
/// null are failures.
pub fn coerce_int(value: &Value) -> Result<i64, ConversionFailure> {
    let failure = || ConversionFailure {
        found: ValueKind::of(value),
    };

    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n.as_f64().and_then(truncate_float).ok_or_else(failure),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| failure()),
        _ => Err(failure()),
    }
}

fn truncate_float(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let truncated = f.trunc();
    // i64::MAX is not exactly representable; the cast below saturates, so bound first
    if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Read a value as display text. Strings are trimmed and must be non-empty;
/// numbers and booleans are rendered; objects, arrays and null yield nothing.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: i64) -> Self {
        Self { min, max: i64::MAX }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == i64::MAX {
            write!(f, "[{}, ∞)", self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}
