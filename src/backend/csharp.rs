//! C# bindings: one enum or `[DataContract]` class per definition, plus
//! `Facade` accessors and foreign key wiring in `Relate()`.

use super::Backend;
use crate::config::Config;
use crate::diagnostics::{Diagnostics, SchemaError};
use crate::schema::{FieldDefinition, SchemaModel, TableKind};
use std::fmt::Write;

const HEADER: &str = "// Code generated by sheetc. DO NOT EDIT.";

pub struct CSharp {
    namespace: String,
}

impl CSharp {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }
}

impl Backend for CSharp {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn file_name(&self, def_name: &str) -> Option<String> {
        Some(format!("{def_name}.cs"))
    }

    fn emit_enum(&self, schema: &SchemaModel, name: &str, diags: &mut Diagnostics) -> Option<String> {
        let Some(def) = schema.enum_def(name).filter(|d| !d.items.is_empty()) else {
            diags.report(name, SchemaError::EmptyDefinition);
            return None;
        };

        let mut out = String::new();
        writeln!(out, "{HEADER}").unwrap();
        writeln!(out, "namespace {}", self.namespace).unwrap();
        writeln!(out, "{{").unwrap();
        summary(&mut out, "    ", &def.description);
        writeln!(out, "    public enum {}", def.name).unwrap();
        writeln!(out, "    {{").unwrap();
        for item in &def.items {
            summary(&mut out, "        ", &item.description);
            writeln!(out, "        {}{} = {},", def.short_name(), item.name, item.value).unwrap();
        }
        writeln!(out, "    }}").unwrap();
        writeln!(out, "}}").unwrap();
        Some(out)
    }

    fn emit_table(
        &self,
        schema: &SchemaModel,
        name: &str,
        config: &Config,
        diags: &mut Diagnostics,
    ) -> Option<String> {
        let Some(table) = schema.table(name).filter(|t| !t.fields.is_empty()) else {
            diags.report(name, SchemaError::EmptyDefinition);
            return None;
        };

        let struct_name = table.struct_name();
        let key = match table.kind {
            TableKind::Rows => table.key_field(),
            _ => None,
        };
        let key_type = key.map(type_name);

        let mut out = String::new();
        let mut relations = String::new();

        writeln!(out, "{HEADER}").unwrap();
        writeln!(out, "using System.Runtime.Serialization;").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "namespace {}", self.namespace).unwrap();
        writeln!(out, "{{").unwrap();
        summary(&mut out, "    ", &table.description);
        writeln!(out, "    [DataContract]").unwrap();
        match &key_type {
            Some(kt) => writeln!(out, "    public class {struct_name} : IConfigStruct<{kt}>").unwrap(),
            None => writeln!(out, "    public class {struct_name}").unwrap(),
        }
        writeln!(out, "    {{").unwrap();

        for field in table.fields.iter().filter(|f| f.visible_to(config.audience)) {
            summary(&mut out, "        ", &field.description);
            writeln!(out, "        [DataMember]").unwrap();
            writeln!(
                out,
                "        public {} {} {{ get; private set; }}",
                array_of(&type_name(field), field.is_array),
                field.name
            )
            .unwrap();

            if let Some(target) = &field.foreign_table {
                let relate = format!("{}2{}", field.name, target);
                let target_struct = format!("{target}Struct");
                summary(&mut out, "        ", &format!("{} --> {}", field.name, target));
                writeln!(
                    out,
                    "        public {} {} {{ get; private set; }}",
                    array_of(&target_struct, field.is_array),
                    relate
                )
                .unwrap();
                write_relation(&mut relations, field, target, &relate, &target_struct);
            }
        }

        if let (Some(key), Some(kt)) = (key, &key_type) {
            writeln!(out).unwrap();
            writeln!(out, "        public {kt} GetKey() {{ return {}; }}", key.name).unwrap();
        }
        writeln!(out).unwrap();
        writeln!(out, "        public void Relate()").unwrap();
        writeln!(out, "        {{").unwrap();
        out.push_str(&relations);
        writeln!(out, "        }}").unwrap();
        writeln!(out, "    }}").unwrap();

        let facade_member = match (table.kind, &key_type) {
            (TableKind::Rows, Some(kt)) => Some(format!(
                "public static DataTable<{kt}, {struct_name}> {name} = DataTable<{kt}, {struct_name}>.Instance;"
            )),
            (TableKind::Singleton, _) => Some(format!("public static {struct_name} {name};")),
            _ => None,
        };
        if let Some(member) = facade_member {
            writeln!(out).unwrap();
            writeln!(out, "    public partial class Facade").unwrap();
            writeln!(out, "    {{").unwrap();
            summary(&mut out, "        ", &table.description);
            writeln!(out, "        {member}").unwrap();
            writeln!(out, "    }}").unwrap();
        }

        writeln!(out, "}}").unwrap();
        Some(out)
    }
}

fn write_relation(out: &mut String, field: &FieldDefinition, target: &str, relate: &str, target_struct: &str) {
    let name = &field.name;
    if field.is_array {
        writeln!(out, "            {relate} = new {target_struct}[{name}.Length];").unwrap();
        writeln!(out, "            for (int i = 0; i < {name}.Length; ++i)").unwrap();
        writeln!(out, "            {{").unwrap();
        writeln!(out, "                {relate}[i] = Facade.{target}Table[{name}[i]];").unwrap();
        writeln!(out, "            }}").unwrap();
    } else {
        writeln!(out, "            {relate} = Facade.{target}Table[{name}];").unwrap();
    }
}

fn summary(out: &mut String, indent: &str, text: &str) {
    writeln!(out, "{indent}/// <summary>").unwrap();
    writeln!(out, "{indent}/// {}", xml_escape(text)).unwrap();
    writeln!(out, "{indent}/// </summary>").unwrap();
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// C# spelling of a field's element type.
fn type_name(field: &FieldDefinition) -> String {
    if field.is_enum || field.is_struct {
        return field.field_type.clone();
    }
    let mapped = match field.field_type.as_str() {
        "float32" => "float",
        "float64" => "double",
        "int16" => "short",
        "int32" => "int",
        "int64" => "long",
        "uint8" => "byte",
        "uint16" => "ushort",
        "uint32" => "uint",
        "uint64" => "ulong",
        other => other,
    };
    mapped.to_string()
}

fn array_of(type_name: &str, is_array: bool) -> String {
    if is_array {
        format!("{type_name}[]")
    } else {
        type_name.to_string()
    }
}
