use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared type of a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Date,
    Int,
    Float,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Date => "date",
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// A typed parameter value supplied by a caller.
///
/// Values are carried out-of-band and bound as query parameters by the
/// execution layer; they never appear inside SQL text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Date(NaiveDate),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Date(_) => ParamKind::Date,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }

    /// Parse a CLI-style literal, trying date, int, then float, falling back
    /// to text.
    pub fn parse_literal(raw: &str) -> ParamValue {
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return ParamValue::Date(d);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return ParamValue::Float(f);
        }
        ParamValue::Text(raw.to_string())
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(d: NaiveDate) -> Self {
        ParamValue::Date(d)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}
