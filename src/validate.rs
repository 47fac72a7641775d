//! Constraint checks on coerced values.
//!
//! Validation never changes or drops a value. Every violation becomes a
//! diagnostic and the value is emitted as is.

use crate::constraint::Bound;
use crate::diagnostics::{Diagnostics, ValidationError};
use crate::schema::{FieldDefinition, SchemaModel};
use crate::types::ScalarKind;
use crate::value::Value;

/// Reference text meaning "no reference".
pub const NO_REFERENCE: &str = "0";

pub struct Validator<'a> {
    schema: &'a SchemaModel,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self { schema }
    }

    /// Array fields get the length check on the whole array and the other
    /// checks per element. Scalars get every check directly.
    pub fn validate(
        &self,
        value: &Value,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) {
        if field.is_array {
            if let Some(bound) = field.length {
                let len = match value {
                    Value::Array(items) => items.len(),
                    _ => 0,
                };
                check_length(len, bound, subject, diags);
            }
            if let Value::Array(items) = value {
                for item in items {
                    self.check_single(item, field, subject, diags);
                }
            }
        } else {
            self.check_single(value, field, subject, diags);
            if let (Some(bound), Value::String(s)) = (field.length, value) {
                if is_plain_string(field) {
                    check_length(s.chars().count(), bound, subject, diags);
                }
            }
        }
    }

    fn check_single(
        &self,
        value: &Value,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) {
        if let Some(table_name) = field.foreign_table_name() {
            self.check_reference(value, table_name, subject, diags);
        }
        if let Some(bound) = field.range {
            check_range(value, bound, subject, diags);
        }
        if field.is_struct {
            self.check_members(value, &field.field_type, subject, diags);
        }
    }

    fn check_reference(&self, value: &Value, table_name: String, subject: &str, diags: &mut Diagnostics) {
        let Some(key) = value.key_text() else {
            return;
        };
        // keys are indexed trimmed
        let key = key.trim().to_string();
        if key == NO_REFERENCE {
            return;
        }
        match self.schema.table(&table_name) {
            None => diags.report(subject, ValidationError::MissingTable(table_name)),
            Some(table) if !table.has_key(&key) => diags.report(
                subject,
                ValidationError::DanglingReference {
                    table: table_name,
                    key,
                },
            ),
            Some(_) => {}
        }
    }

    /// Struct members are checked against the template's own constraints.
    fn check_members(&self, value: &Value, type_name: &str, subject: &str, diags: &mut Diagnostics) {
        let (Value::Object(members), Some(template)) = (value, self.schema.table(type_name)) else {
            return;
        };
        for (name, member) in members {
            if let Some(field) = template.field(name) {
                self.validate(member, field, &format!("{subject}.{name}"), diags);
            }
        }
    }
}

fn is_plain_string(field: &FieldDefinition) -> bool {
    !field.is_enum && !field.is_struct && field.scalar_kind() == ScalarKind::String
}

fn check_range(value: &Value, bound: Bound, subject: &str, diags: &mut Diagnostics) {
    match value.as_f64() {
        Some(v) if bound.contains(v) => {}
        Some(_) => diags.report(
            subject,
            ValidationError::OutOfRange {
                value: value.to_json(),
                bound,
            },
        ),
        None => diags.report(subject, ValidationError::NotNumeric(value.to_json())),
    }
}

fn check_length(len: usize, bound: Bound, subject: &str, diags: &mut Diagnostics) {
    if !bound.contains(len as f64) {
        diags.report(subject, ValidationError::Length { len, bound });
    }
}
