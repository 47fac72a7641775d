//! Diagnostics reported while compiling a workbook.
//!
//! Nothing in the compiler aborts on bad input. Every problem becomes a
//! [`Diagnostic`] pushed into a [`Diagnostics`] sink and the offending unit is
//! skipped or degraded.

use crate::constraint::Bound;
use crate::sheet::SheetError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Problems with the shape of a sheet or its declarations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("duplicate definition")]
    DuplicateDefinition,
    #[error("malformed sheet: need at least {cols} columns and {rows} rows")]
    MalformedSheet { cols: usize, rows: usize },
    #[error("missing primary key")]
    MissingKey,
    #[error("key field must not be an array")]
    ArrayKey,
    #[error("invalid field type: {0:?}")]
    InvalidType(String),
    #[error("malformed constraint: {0}")]
    MalformedConstraint(String),
    #[error("duplicate enum item: {0}")]
    DuplicateItem(String),
    #[error("missing config data")]
    MissingData,
    #[error("empty definition")]
    EmptyDefinition,
}

/// Cell text that could not be turned into a value of the field's type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("{0:?} is not a number")]
    Number(String),
    #[error("{0:?} is not an integer")]
    Integer(String),
    #[error("{0:?} is not an unsigned integer")]
    Unsigned(String),
    #[error("{0:?} is not an array")]
    Array(String),
    #[error("{text:?} cannot be decoded as {type_name}")]
    Struct { text: String, type_name: String },
    #[error("struct type {0} is not defined")]
    UnknownStruct(String),
    #[error("enum item {enum_name}.{item} is not defined")]
    UnknownEnumItem { enum_name: String, item: String },
}

/// Coerced values that break a declared constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("value {value} out of range {bound}")]
    OutOfRange { value: String, bound: Bound },
    #[error("value {0} is not numeric")]
    NotNumeric(String),
    #[error("length {len} out of range {bound}")]
    Length { len: usize, bound: Bound },
    #[error("missing referenced table {0}")]
    MissingTable(String),
    #[error("reference {key} not found in {table}")]
    DanglingReference { table: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Problem {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A sheet file that could not be read, with the loader's message.
    #[error("cannot load sheet file: {0}")]
    Load(String),
}

impl From<SheetError> for Problem {
    fn from(err: SheetError) -> Self {
        Problem::Load(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Where the problem was found, e.g. `HeroTable line 6 Level`.
    pub subject: String,
    pub problem: Problem,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.problem)
    }
}

/// Accumulating diagnostic stream. Each report is also logged through `tracing`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, subject: impl Into<String>, problem: impl Into<Problem>) {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            subject: subject.into(),
            problem: problem.into(),
        };
        tracing::error!(subject = %diagnostic.subject, "{}", diagnostic.problem);
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
