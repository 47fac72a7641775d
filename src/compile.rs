//! Drives coercion and validation over whole tables.

use crate::backend::{Artifact, Backend};
use crate::config::Config;
use crate::constraint::Visibility;
use crate::coerce::Coercer;
use crate::diagnostics::{Diagnostics, SchemaError};
use crate::schema::{FIRST_DATA_ROW, SchemaModel, TableDefinition, TableKind};
use crate::sheet::{Loaded, Sheet};
use crate::validate::Validator;
use crate::value::Value;

/// The records emitted for one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Rows(Vec<Value>),
    Single(Value),
}

impl Document {
    /// Row tables become an array with one record per line.
    pub fn to_json(&self) -> String {
        match self {
            Document::Single(record) => record.to_json(),
            Document::Rows(records) => {
                let body: Vec<String> = records.iter().map(Value::to_json).collect();
                format!("[{}]", body.join(",\n"))
            }
        }
    }
}

/// Coerce and validate the visible fields of one data row.
pub fn compile_record(
    schema: &SchemaModel,
    table: &TableDefinition,
    row_index: usize,
    audience: Visibility,
    diags: &mut Diagnostics,
) -> Value {
    let coercer = Coercer::new(schema);
    let validator = Validator::new(schema);
    let row = &table.rows[row_index];
    let line = FIRST_DATA_ROW + row_index + 1;

    let mut members = Vec::new();
    for (col, field) in table.fields.iter().enumerate() {
        if !field.visible_to(audience) {
            continue;
        }
        let subject = format!("{} line {} {}", table.name, line, field.name);
        let text = row.get(col).map(String::as_str).unwrap_or("");
        let value = coercer.coerce_cell(text, field, &subject, diags);
        validator.validate(&value, field, &subject, diags);
        members.push((field.name.clone(), value));
    }
    Value::Object(members)
}

/// Compile every record of a table.
///
/// Struct templates have no document. A singleton config without data rows
/// is reported and skipped.
pub fn compile_table(
    schema: &SchemaModel,
    name: &str,
    audience: Visibility,
    diags: &mut Diagnostics,
) -> Option<Document> {
    let Some(table) = schema.table(name).filter(|t| !t.fields.is_empty()) else {
        diags.report(name, SchemaError::EmptyDefinition);
        return None;
    };

    match table.kind {
        TableKind::Struct => None,
        TableKind::Singleton => {
            if table.rows.is_empty() {
                diags.report(name, SchemaError::MissingData);
                return None;
            }
            Some(Document::Single(compile_record(schema, table, 0, audience, diags)))
        }
        TableKind::Rows => {
            let records = (0..table.rows.len())
                .map(|i| compile_record(schema, table, i, audience, diags))
                .collect();
            Some(Document::Rows(records))
        }
    }
}

/// One compilation run: the schema built from all sheets plus every
/// diagnostic reported so far.
#[derive(Debug)]
pub struct Compilation {
    pub schema: SchemaModel,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn from_sheets(sheets: &[Sheet]) -> Self {
        Self::build(sheets, Diagnostics::new())
    }

    /// Like [`Compilation::from_sheets`], with every file that failed to
    /// load reported first.
    pub fn from_loaded(loaded: Loaded) -> Self {
        let mut diagnostics = Diagnostics::new();
        for (path, err) in loaded.failures {
            diagnostics.report(path.display().to_string(), err);
        }
        Self::build(&loaded.sheets, diagnostics)
    }

    fn build(sheets: &[Sheet], mut diagnostics: Diagnostics) -> Self {
        let schema = SchemaModel::build(sheets, &mut diagnostics);
        Self {
            schema,
            diagnostics,
        }
    }

    /// Run a backend over every enum and table, in name order.
    pub fn emit(&mut self, backend: &dyn Backend, config: &Config) -> Vec<Artifact> {
        let mut artifacts = Vec::new();

        for def in self.schema.enums() {
            let Some(file_name) = backend.file_name(&def.name) else {
                continue;
            };
            tracing::info!("Generating {} ({})", def.name, backend.name());
            if let Some(contents) = backend.emit_enum(&self.schema, &def.name, &mut self.diagnostics) {
                artifacts.push(Artifact { file_name, contents });
            }
        }

        for table in self.schema.tables() {
            let Some(file_name) = backend.file_name(&table.name) else {
                continue;
            };
            tracing::info!("Generating {} ({})", table.name, backend.name());
            if let Some(contents) =
                backend.emit_table(&self.schema, &table.name, config, &mut self.diagnostics)
            {
                artifacts.push(Artifact { file_name, contents });
            }
        }

        artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Json;
    use crate::diagnostics::{Problem, ValidationError};
    use crate::schema::tests::table_sheet;

    fn heroes() -> Sheet {
        table_sheet(
            "HeroTable",
            &["K", "A", "A;R[1,99]", "C"],
            &["int32", "string", "int32", "string"],
            &["Id", "Name", "Level", "Portrait"],
            &[&["1", "Hero", "150", "hero.png"], &["2", "Villain", "10", "villain.png"]],
        )
    }

    #[test]
    fn test_hero_scenario() {
        let compilation = Compilation::from_sheets(&[heroes()]);
        let mut diags = Diagnostics::new();
        let document =
            compile_table(&compilation.schema, "HeroTable", Visibility::Server, &mut diags).unwrap();

        assert_eq!(
            document.to_json(),
            "[{\"Id\":1,\"Name\":\"Hero\",\"Level\":150},\n{\"Id\":2,\"Name\":\"Villain\",\"Level\":10}]"
        );
        let all = diags.into_vec();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subject, "HeroTable line 6 Level");
        assert_eq!(
            all[0].problem,
            Problem::Validation(ValidationError::OutOfRange {
                value: "150".to_string(),
                bound: crate::constraint::Bound::Between(1.0, 99.0),
            })
        );
    }

    #[test]
    fn test_audience_selects_fields() {
        let compilation = Compilation::from_sheets(&[heroes()]);
        let mut diags = Diagnostics::new();
        let Some(Document::Rows(records)) =
            compile_table(&compilation.schema, "HeroTable", Visibility::Client, &mut diags)
        else {
            panic!("expected rows");
        };
        assert_eq!(records[0].get("Portrait"), Some(&Value::String("hero.png".to_string())));
        assert!(records[0].get("Id").is_some());
    }

    #[test]
    fn test_singleton() {
        let settings = table_sheet(
            "GameSettings",
            &["A", "A"],
            &["int", "[]float"],
            &["MaxLevel", "Speeds"],
            &[&["99", "[1.5, 2]"]],
        );
        let empty = table_sheet("EmptySettings", &["A", "A"], &["int", "int"], &["MaxLevel", "MinLevel"], &[]);
        let compilation = Compilation::from_sheets(&[settings, empty]);
        let mut diags = Diagnostics::new();

        let document =
            compile_table(&compilation.schema, "GameSettings", Visibility::Server, &mut diags).unwrap();
        assert_eq!(document.to_json(), r#"{"MaxLevel":99,"Speeds":[1.5,2]}"#);

        assert!(compile_table(&compilation.schema, "EmptySettings", Visibility::Server, &mut diags).is_none());
        assert_eq!(
            diags.into_vec()[0].problem,
            Problem::Schema(SchemaError::MissingData)
        );
    }

    #[test]
    fn test_struct_template_has_no_document() {
        let template = table_sheet("RewardStruct", &["A", "A"], &["int", "int"], &["ItemId", "Count"], &[]);
        let compilation = Compilation::from_sheets(&[template]);
        let mut diags = Diagnostics::new();
        assert!(compile_table(&compilation.schema, "RewardStruct", Visibility::Server, &mut diags).is_none());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unknown_table() {
        let compilation = Compilation::from_sheets(&[]);
        let mut diags = Diagnostics::new();
        assert!(compile_table(&compilation.schema, "NopeTable", Visibility::Server, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_load_failures_are_diagnostics() {
        let loaded = Loaded {
            sheets: vec![heroes()],
            failures: vec![(
                "sheets/ItemTable.csv".into(),
                crate::sheet::SheetError::Unnamed("sheets/ItemTable.csv".into()),
            )],
        };
        let compilation = Compilation::from_loaded(loaded);

        assert!(compilation.schema.table("HeroTable").is_some());
        let all = compilation.diagnostics.into_vec();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subject, "sheets/ItemTable.csv");
        assert!(matches!(all[0].problem, Problem::Load(_)));
    }

    #[test]
    fn test_emit_json_artifacts() {
        let template = table_sheet("RewardStruct", &["A", "A"], &["int", "int"], &["ItemId", "Count"], &[]);
        let mut compilation = Compilation::from_sheets(&[heroes(), template]);
        let artifacts = compilation.emit(&Json, &Config::default());

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].file_name, "HeroTable.json");
        assert_eq!(compilation.diagnostics.len(), 1);
    }
}
