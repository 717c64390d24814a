//! Property value types for annotation nodes
//!
//! Properties are multi-valued: every key holds a declared [`ValueKind`] and an
//! ordered list of values. Raw text coming from a document is coerced loosely
//! into the declared kind; text that cannot be coerced is kept as
//! [`PropertyValue::Invalid`] so loading never aborts on bad data.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::store::GraphError;

/// Declared type of a property key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Float,
    Integer,
    Boolean,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Float => "float",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
        }
    }

    /// Coerce raw document text into a value of this kind
    pub fn parse(&self, raw: &str) -> PropertyValue {
        match self {
            ValueKind::String => PropertyValue::String(raw.to_string()),
            ValueKind::Integer => parse_leading_integer(raw)
                .map(PropertyValue::Integer)
                .unwrap_or_else(|| PropertyValue::Invalid(raw.to_string())),
            ValueKind::Float => parse_leading_float(raw)
                .map(PropertyValue::Float)
                .unwrap_or_else(|| PropertyValue::Invalid(raw.to_string())),
            ValueKind::Boolean => PropertyValue::Boolean(raw == "true"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(ValueKind::String),
            "float" => Ok(ValueKind::Float),
            "integer" => Ok(ValueKind::Integer),
            "boolean" => Ok(ValueKind::Boolean),
            _ => Err(GraphError::UnknownValueKind(s.to_string())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Raw text that could not be coerced into the declared kind
    Invalid(String),
}

impl PropertyValue {
    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric reading of integers and floats
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, PropertyValue::Invalid(_))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// All values recorded under one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub kind: ValueKind,
    pub values: Vec<PropertyValue>,
}

impl Property {
    pub fn new(kind: ValueKind) -> Self {
        Property {
            kind,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Property map for storing node properties, in insertion order
pub type PropertyMap = IndexMap<String, Property>;

static INTEGER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("invalid integer regex"));

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("invalid float regex")
});

/// Parse the longest leading integer of `raw` (`"12px"` reads as 12)
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    INTEGER_PREFIX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse the longest leading decimal number of `raw` (`"2.5e3x"` reads as 2500)
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    FLOAT_PREFIX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
