//! Scalar values held by properties

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Int,
    Float,
    #[serde(alias = "string")]
    Str,
}

impl PropertyType {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Str => "str",
        }
    }
}

/// A scalar value: property contents, setter captures, template arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Convert to the given type using the type's standard parse
    ///
    /// Text is parsed after trimming surrounding whitespace; floats become
    /// integers by truncation; anything becomes text through `Display`.
    pub fn coerce(&self, kind: PropertyType) -> Option<Value> {
        match (kind, self) {
            (PropertyType::Int, Value::Int(v)) => Some(Value::Int(*v)),
            (PropertyType::Int, Value::Float(v)) => {
                v.is_finite().then(|| Value::Int(v.trunc() as i64))
            }
            (PropertyType::Int, Value::Str(s)) => s.trim().parse().ok().map(Value::Int),
            (PropertyType::Float, Value::Int(v)) => Some(Value::Float(*v as f64)),
            (PropertyType::Float, Value::Float(v)) => Some(Value::Float(*v)),
            (PropertyType::Float, Value::Str(s)) => s.trim().parse().ok().map(Value::Float),
            (PropertyType::Str, Value::Str(s)) => Some(Value::Str(s.clone())),
            (PropertyType::Str, other) => Some(Value::Str(other.to_string())),
        }
    }

    pub fn kind(&self) -> PropertyType {
        match self {
            Value::Int(_) => PropertyType::Int,
            Value::Float(_) => PropertyType::Float,
            Value::Str(_) => PropertyType::Str,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Str(_), _) | (_, Value::Str(_)) => None,
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_from_text() {
        assert_eq!(Value::from("42").coerce(PropertyType::Int), Some(Value::Int(42)));
        assert_eq!(Value::from("2.5").coerce(PropertyType::Float), Some(Value::Float(2.5)));
        assert_eq!(Value::from("2.5").coerce(PropertyType::Int), None);
        assert_eq!(Value::from("abc").coerce(PropertyType::Float), None);
        assert_eq!(Value::from("abc").coerce(PropertyType::Str), Some(Value::from("abc")));
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(Value::Float(2.9).coerce(PropertyType::Int), Some(Value::Int(2)));
        assert_eq!(Value::Int(3).coerce(PropertyType::Float), Some(Value::Float(3.0)));
        assert_eq!(Value::Float(2.0).coerce(PropertyType::Str), Some(Value::from("2.0")));
    }

    #[test]
    fn test_ordering() {
        assert!(Value::Int(1) < Value::Int(2));
        assert!(Value::Float(1.5) > Value::Int(1));
        assert_eq!(Value::from("a").partial_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(10.0).to_string(), "10.0");
        assert_eq!(Value::Float(10.3).to_string(), "10.3");
        assert_eq!(Value::Int(-7).to_string(), "-7");
    }

    #[test]
    fn test_deserialize_property_type() {
        let t: PropertyType = serde_json::from_str("\"string\"").unwrap();
        assert_eq!(t, PropertyType::Str);
        let t: PropertyType = serde_json::from_str("\"float\"").unwrap();
        assert_eq!(t, PropertyType::Float);
    }
}
