// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::fmt;

use arrow::datatypes::DataType;

/// One cell of a generated table.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Float64(f64),
    Int64(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Float64(_) => DataType::Float64,
            Value::Int64(_) => DataType::Int64,
            Value::Boolean(_) => DataType::Boolean,
            Value::String(_) => DataType::Utf8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Boolean(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::Null | Value::Float64(_) | Value::String(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Null | Value::String(_) => None,
        }
    }

    /// Binary indicators are stored either as booleans or as 0/1 integers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::Int64(0) => Some(false),
            Value::Int64(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::Value;

    #[test]
    fn test_conversions() {
        assert_eq!(Some(1.0), Value::Boolean(true).as_f64());
        assert_eq!(Some(3.0), Value::Int64(3).as_f64());
        assert_eq!(None, Value::Float64(3.5).as_i64());
        assert_eq!(Some(true), Value::Int64(1).as_bool());
        assert_eq!(None, Value::Int64(2).as_bool());
        assert_eq!(Some("3"), Value::from("3").as_str());
        assert!(Value::Null.as_f64().is_none());
    }
}
