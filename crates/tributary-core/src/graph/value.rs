//! Typed property values.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::schema::PropertyKind;

/// A property value as held by a graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    List(Vec<String>),
}

impl PropertyValue {
    /// Render for the wire. Timestamps become ISO-8601 with an explicit offset.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Integer(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::Timestamp(t) => Value::String(format_timestamp(t)),
            PropertyValue::List(items) => Value::from(items.clone()),
        }
    }

    /// Coerce a raw JSON value into the declared kind.
    ///
    /// Numbers are accepted for string properties since upstream trackers
    /// hand out numeric ids. Naive timestamps are taken to be UTC.
    pub fn from_json(kind: &PropertyKind, raw: &Value) -> Result<Self, String> {
        if raw.is_null() {
            return Ok(PropertyValue::Null);
        }

        match kind {
            PropertyKind::String => match raw {
                Value::String(s) => Ok(PropertyValue::String(s.clone())),
                Value::Number(n) => Ok(PropertyValue::String(n.to_string())),
                Value::Bool(b) => Ok(PropertyValue::String(b.to_string())),
                other => Err(format!("expected a string, got {}", other)),
            },
            PropertyKind::Integer => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .map(PropertyValue::Integer)
                    .ok_or_else(|| format!("expected an integer, got {}", n)),
                Value::String(s) => s
                    .parse()
                    .map(PropertyValue::Integer)
                    .map_err(|_| format!("expected an integer, got {:?}", s)),
                other => Err(format!("expected an integer, got {}", other)),
            },
            PropertyKind::Float => match raw {
                Value::Number(n) => n
                    .as_f64()
                    .map(PropertyValue::Float)
                    .ok_or_else(|| format!("expected a float, got {}", n)),
                Value::String(s) => s
                    .parse()
                    .map(PropertyValue::Float)
                    .map_err(|_| format!("expected a float, got {:?}", s)),
                other => Err(format!("expected a float, got {}", other)),
            },
            PropertyKind::Timestamp => match raw {
                Value::String(s) => parse_timestamp(s).map(PropertyValue::Timestamp),
                other => Err(format!("expected a timestamp, got {}", other)),
            },
            PropertyKind::StringList => match raw {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(format!("expected a list of strings, got {}", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(PropertyValue::List),
                other => Err(format!("expected a list of strings, got {}", other)),
            },
            PropertyKind::Enum(allowed) => match raw {
                Value::String(s) if allowed.contains(s) => Ok(PropertyValue::String(s.clone())),
                Value::String(s) => Err(format!("{:?} is not one of {}", s, allowed.join(", "))),
                other => Err(format!("expected one of {}, got {}", allowed.join(", "), other)),
            },
        }
    }

    /// String form of an identifier-like value.
    pub fn as_id(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) => Some(s.clone()),
            PropertyValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
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

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(value)
    }
}

fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Ok(parsed.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("{:?} is not an ISO-8601 timestamp", s))
}
