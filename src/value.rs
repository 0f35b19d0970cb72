//! Dynamically typed fact payload values.

use crate::fact::FactRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A value held in a fact's payload, or produced by an accumulator.
///
/// Mirrors spec.md §3's "numbers, strings, booleans, timestamps, nested
/// mappings", plus `List` for arrays and `FactList` for the value an
/// accumulator's `collect-all` binds (spec.md §4.8) — a sequence of facts
/// is not itself a scalar, so it gets its own variant rather than being
/// smuggled through `List`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating point number
    Number(f64),
    /// String value
    Str(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
    /// Nested mapping
    Map(HashMap<String, Value>),
    /// Array of values
    List(Vec<Value>),
    /// A sequence of facts, bound by the `collect-all` aggregator
    #[serde(skip)]
    FactList(Vec<FactRef>),
    /// Absence of a value
    Null,
}

impl Value {
    /// Convert to a number if this value is numeric.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string contents if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the boolean contents if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Int(a), Value::Number(b)) | (Value::Number(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::FactList(a), Value::FactList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id() == y.id())
            }
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A fact's payload: a mapping from string keys to dynamically typed values.
pub type Payload = HashMap<String, Value>;
