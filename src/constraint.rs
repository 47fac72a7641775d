//! Per-column constraint annotations: `K;A;L[1,8];R[0,100];F[Item]`.

use crate::diagnostics::{Diagnostics, SchemaError};
use std::fmt;

/// Visibility class of a field. `All` fields are emitted for every audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    Server,
    Client,
}

impl Visibility {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "A" => Some(Self::All),
            "S" => Some(Self::Server),
            "C" => Some(Self::Client),
            _ => None,
        }
    }
}

/// Inclusive numeric bound. One value is an upper limit, two are `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Max(f64),
    Between(f64, f64),
}

impl Bound {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        match *values {
            [max] => Some(Self::Max(max)),
            [min, max] => Some(Self::Between(min, max)),
            _ => None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Self::Max(max) => value <= max,
            Self::Between(min, max) => min <= value && value <= max,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max(max) => write!(f, "[{max}]"),
            Self::Between(min, max) => write!(f, "[{min}, {max}]"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub key: bool,
    pub visibility: Option<Visibility>,
    pub length: Option<Bound>,
    pub range: Option<Bound>,
    pub foreign_table: Option<String>,
}

/// The column a constraint string belongs to.
pub struct ColumnContext<'a> {
    pub subject: &'a str,
    pub field_type: &'a str,
    pub is_array: bool,
    /// The table already has a key column.
    pub key_taken: bool,
}

/// Parse a semicolon separated annotation string.
///
/// Unknown segments are ignored. Malformed bound payloads are reported and
/// leave the bound unset.
pub fn parse(annotation: &str, column: &ColumnContext<'_>, diags: &mut Diagnostics) -> Constraints {
    let mut constraints = Constraints::default();

    for segment in annotation.split(';').map(str::trim) {
        if segment == "K" {
            if column.key_taken || constraints.key || column.field_type.is_empty() {
                continue;
            }
            constraints.key = true;
            if column.is_array {
                diags.report(column.subject, SchemaError::ArrayKey);
            }
        } else if let Some(visibility) = Visibility::from_tag(segment) {
            constraints.visibility = Some(visibility);
        } else if let Some(payload) = bracketed(segment, 'L') {
            constraints.length = parse_length(payload);
            if constraints.length.is_none() {
                report_malformed(column.subject, segment, diags);
            }
        } else if let Some(payload) = bracketed(segment, 'R') {
            constraints.range = parse_range(payload);
            if constraints.range.is_none() {
                report_malformed(column.subject, segment, diags);
            }
        } else if let Some(payload) = bracketed(segment, 'F') {
            let target = &payload[1..payload.len() - 1];
            if !target.is_empty() {
                constraints.foreign_table = Some(target.to_string());
            }
        }
    }

    constraints
}

/// `X[...]` -> `[...]`
fn bracketed(segment: &str, tag: char) -> Option<&str> {
    let payload = segment.strip_prefix(tag)?;
    (payload.starts_with('[') && payload.ends_with(']') && payload.len() >= 2).then_some(payload)
}

fn parse_length(payload: &str) -> Option<Bound> {
    let values: Vec<u64> = serde_json::from_str(payload).ok()?;
    let values: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
    Bound::from_values(&values)
}

fn parse_range(payload: &str) -> Option<Bound> {
    let values: Vec<f64> = serde_json::from_str(payload).ok()?;
    Bound::from_values(&values)
}

fn report_malformed(subject: &str, segment: &str, diags: &mut Diagnostics) {
    diags.report(subject, SchemaError::MalformedConstraint(segment.to_string()));
}
