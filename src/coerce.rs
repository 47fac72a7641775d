//! Cell text to typed values.
//!
//! There is a single pipeline. A sheet cell is coerced by the rules of its
//! field type. Array cells and struct cells hold JSON; each element (or
//! member) is a JSON token which is unwrapped when it is a JSON string and
//! then coerced by the same rules as a plain cell.
//!
//! Default values:
//! - empty unsigned cell: `0`
//! - empty array cell: `null`
//! - empty bool cell: `false`
//! - empty string cell: `""`
//! - empty signed or float cell: parse error, raw text kept
//!
//! Coercion only reads the schema. Failures are reported and the raw text is
//! carried into the output as [`Value::Raw`] (scalars) or replaced by
//! [`Value::Null`] (arrays and structs).

use crate::diagnostics::{CoercionError, Diagnostics};
use crate::schema::{EnumItem, FieldDefinition, SchemaModel};
use crate::types::ScalarKind;
use crate::value::Value;
use serde_json::value::RawValue;
use std::collections::HashMap;

pub struct Coercer<'a> {
    schema: &'a SchemaModel,
}

impl<'a> Coercer<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self { schema }
    }

    /// Coerce the text of one sheet cell for `field`.
    pub fn coerce_cell(
        &self,
        text: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        if field.is_array {
            self.coerce_array(text, field, subject, diags)
        } else {
            self.coerce_single(text, field, subject, diags)
        }
    }

    /// Coerce text as one (non-array) instance of `field`.
    fn coerce_single(
        &self,
        text: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        if field.is_struct {
            return self.coerce_struct(text, &field.field_type, subject, diags);
        }
        if field.is_enum {
            return self.coerce_enum(text, field, subject, diags);
        }
        match field.scalar_kind() {
            ScalarKind::Bool => Value::Bool(to_bool(text)),
            ScalarKind::String => Value::String(text.to_string()),
            ScalarKind::Float => to_float(text, subject, diags),
            ScalarKind::Unsigned => to_unsigned(text, subject, diags),
            ScalarKind::Signed => to_signed(text, subject, diags),
        }
    }

    fn coerce_array(
        &self,
        text: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        let text = text.trim();
        if text.is_empty() {
            return Value::Null;
        }
        let Ok(tokens) = serde_json::from_str::<Vec<Box<RawValue>>>(text) else {
            diags.report(subject, CoercionError::Array(text.to_string()));
            return Value::Null;
        };
        let items = tokens
            .iter()
            .map(|token| self.coerce_token(token.get(), field, subject, diags))
            .collect();
        Value::Array(items)
    }

    /// Coerce one JSON token taken out of an array or struct cell.
    fn coerce_token(
        &self,
        token: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        // bare numbers are enum values already
        if field.is_enum && serde_json::from_str::<i64>(token).is_ok() {
            return Value::Number(token.to_string());
        }
        self.coerce_single(&unwrap_token(token), field, subject, diags)
    }

    /// Struct members may themselves be arrays.
    fn coerce_member(
        &self,
        token: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        if field.is_array {
            self.coerce_array(&unwrap_token(token), field, subject, diags)
        } else {
            self.coerce_token(token, field, subject, diags)
        }
    }

    fn coerce_struct(
        &self,
        text: &str,
        type_name: &str,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        let Some(template) = self.schema.table(type_name) else {
            diags.report(subject, CoercionError::UnknownStruct(type_name.to_string()));
            return Value::Null;
        };

        let text = text.trim();
        let malformed = |diags: &mut Diagnostics| {
            diags.report(
                subject,
                CoercionError::Struct {
                    text: text.to_string(),
                    type_name: type_name.to_string(),
                },
            );
            Value::Null
        };

        let fields = template.fields.iter().filter(|f| !f.is_inert());
        let members = if text.starts_with('[') && text.ends_with(']') {
            // positional: extra tokens are ignored, missing ones are absent
            let Ok(tokens) = serde_json::from_str::<Vec<Box<RawValue>>>(text) else {
                return malformed(diags);
            };
            template
                .fields
                .iter()
                .zip(tokens.iter())
                .filter(|(field, _)| !field.is_inert())
                .map(|(field, token)| {
                    let member_subject = format!("{subject}.{}", field.name);
                    let value = self.coerce_member(token.get(), field, &member_subject, diags);
                    (field.name.clone(), value)
                })
                .collect()
        } else if text.starts_with('{') && text.ends_with('}') {
            // by name: unknown keys are dropped
            let Ok(tokens) = serde_json::from_str::<HashMap<String, Box<RawValue>>>(text) else {
                return malformed(diags);
            };
            fields
                .filter_map(|field| {
                    let token = tokens.get(&field.name)?;
                    let member_subject = format!("{subject}.{}", field.name);
                    let value = self.coerce_member(token.get(), field, &member_subject, diags);
                    Some((field.name.clone(), value))
                })
                .collect()
        } else {
            return malformed(diags);
        };

        Value::Object(members)
    }

    fn coerce_enum(
        &self,
        text: &str,
        field: &FieldDefinition,
        subject: &str,
        diags: &mut Diagnostics,
    ) -> Value {
        let name = text.trim();
        let item = self
            .schema
            .enum_def(&field.field_type)
            .and_then(|def| def.item(name));
        if let Some(item) = item {
            return enum_value(item);
        }
        diags.report(
            subject,
            CoercionError::UnknownEnumItem {
                enum_name: field.field_type.clone(),
                item: name.to_string(),
            },
        );
        to_signed(name, subject, diags)
    }
}

fn enum_value(item: &EnumItem) -> Value {
    if serde_json::from_str::<i64>(&item.value).is_ok() {
        Value::Number(item.value.clone())
    } else {
        Value::Raw(item.value.clone())
    }
}

/// JSON string tokens yield their content, `null` yields empty text, any
/// other token is used as written.
fn unwrap_token(token: &str) -> String {
    match serde_json::from_str::<Option<String>>(token) {
        Ok(Some(s)) => s,
        Ok(None) => String::new(),
        Err(_) => token.to_string(),
    }
}

/// `true` in any case, or a non-zero integer. Everything else is `false`.
pub fn to_bool(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("true") || text.parse::<i64>().is_ok_and(|v| v != 0)
}

fn to_float(text: &str, subject: &str, diags: &mut Diagnostics) -> Value {
    let text = text.trim();
    if serde_json::from_str::<f64>(text).is_ok() {
        return Value::Number(text.to_string());
    }
    diags.report(subject, CoercionError::Number(text.to_string()));
    Value::Raw(text.to_string())
}

fn to_unsigned(text: &str, subject: &str, diags: &mut Diagnostics) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Number("0".to_string());
    }
    if serde_json::from_str::<u64>(text).is_ok() {
        return Value::Number(text.to_string());
    }
    diags.report(subject, CoercionError::Unsigned(text.to_string()));
    Value::Raw(text.to_string())
}

fn to_signed(text: &str, subject: &str, diags: &mut Diagnostics) -> Value {
    let text = text.trim();
    if serde_json::from_str::<i64>(text).is_ok() {
        return Value::Number(text.to_string());
    }
    diags.report(subject, CoercionError::Integer(text.to_string()));
    Value::Raw(text.to_string())
}
