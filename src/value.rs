//! Typed output values and their JSON text form.

use std::fmt::{self, Write};

/// A coerced cell value.
///
/// Numbers keep the literal text they were parsed from so emitted documents
/// carry exactly what the sheet said. `Raw` holds text that failed to parse;
/// it is written out verbatim, producing a deliberately malformed token that
/// the accompanying diagnostic points at.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Array(Vec<Value>),
    /// Members in declaration order.
    Object(Vec<(String, Value)>),
    Raw(String),
}

impl Value {
    /// Numeric reading of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(text) | Value::Raw(text) => serde_json::from_str(text.trim()).ok(),
            _ => None,
        }
    }

    /// Text used to look the value up as a foreign key.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Value::Number(text) | Value::String(text) | Value::Raw(text) => Some(text.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        match self {
            Value::Object(members) => members.iter().find(|(n, _)| n == member).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    pub fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => write!(out, "{b}").unwrap(),
            Value::Number(text) | Value::Raw(text) => out.push_str(text),
            Value::String(s) => write_string(out, s),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Object(members) => {
                out.push('{');
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_string(out, name);
                    out.push(':');
                    value.write_json(out);
                }
                out.push('}');
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

fn write_string(out: &mut String, s: &str) {
    write!(out, "{}", serde_json::Value::from(s)).unwrap();
}
