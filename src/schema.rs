//! The schema model: every enum and table declared by the ingested sheets.
//!
//! Definitions reference each other by name only (struct-typed fields name a
//! struct template, foreign keys name a row table). Lookups go through
//! [`SchemaModel`] at coercion and validation time.

use crate::constraint::{self, Bound, ColumnContext, Visibility};
use crate::diagnostics::{Diagnostics, SchemaError};
use crate::sheet::{Sheet, SheetKind};
use crate::types::{self, ScalarKind};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sheet rows holding table metadata; data starts right after.
const DESCRIPTION_ROW: usize = 0;
const FIELD_DESCRIPTION_ROW: usize = 1;
const CONSTRAINT_ROW: usize = 2;
const TYPE_ROW: usize = 3;
const NAME_ROW: usize = 4;
pub const FIRST_DATA_ROW: usize = 5;

const FIRST_ENUM_ITEM_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub name: String,
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    pub name: String,
    pub description: String,
    pub items: Vec<EnumItem>,
    index: HashMap<String, usize>,
}

impl EnumDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append an item. Returns `false` (and keeps the first) on a repeated name.
    pub fn push(&mut self, item: EnumItem) -> bool {
        if self.index.contains_key(&item.name) {
            return false;
        }
        self.index.insert(item.name.clone(), self.items.len());
        self.items.push(item);
        true
    }

    pub fn item(&self, name: &str) -> Option<&EnumItem> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    /// Name without the `Enum` suffix, used to prefix generated item names.
    pub fn short_name(&self) -> &str {
        self.name.strip_suffix("Enum").unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    /// Canonical element type: a scalar keyword, an enum name or a struct name.
    pub field_type: String,
    pub description: String,
    pub is_array: bool,
    pub is_key: bool,
    pub is_enum: bool,
    pub is_struct: bool,
    pub visibility: Option<Visibility>,
    pub length: Option<Bound>,
    pub range: Option<Bound>,
    pub foreign_table: Option<String>,
}

impl FieldDefinition {
    /// Build a field from a canonical (possibly array) type name.
    pub fn new(name: impl Into<String>, full_type: &str) -> Self {
        let (is_array, element) = types::split_array(full_type);
        Self {
            name: name.into(),
            field_type: element.to_string(),
            is_array,
            is_enum: element.ends_with("Enum"),
            is_struct: element.ends_with("Struct"),
            ..Self::default()
        }
    }

    /// Unnamed or untyped columns are carried along but never coerced or emitted.
    pub fn is_inert(&self) -> bool {
        self.name.is_empty() || self.field_type.is_empty()
    }

    pub fn scalar_kind(&self) -> ScalarKind {
        ScalarKind::of(&self.field_type)
    }

    pub fn visible_to(&self, audience: Visibility) -> bool {
        !self.is_inert()
            && (self.is_key
                || self.visibility == Some(Visibility::All)
                || self.visibility == Some(audience))
    }

    /// Name of the row table a foreign key points at.
    pub fn foreign_table_name(&self) -> Option<String> {
        self.foreign_table.as_ref().map(|t| format!("{t}Table"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Rows,
    Singleton,
    Struct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub description: String,
    pub kind: TableKind,
    /// Column index of the primary key.
    pub key: Option<usize>,
    pub fields: Vec<FieldDefinition>,
    pub rows: Vec<Vec<String>>,
    keys: HashSet<String>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            key: None,
            fields: Vec::new(),
            rows: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Append a field; a key field claims the key slot if it is free.
    pub fn push_field(&mut self, mut field: FieldDefinition) {
        if field.is_key {
            if self.key.is_some() {
                field.is_key = false;
            } else {
                self.key = Some(self.fields.len());
            }
        }
        self.fields.push(field);
    }

    /// Append a data row, padded or cut to the field count. Row tables record
    /// its trimmed key text.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.fields.len(), String::new());
        if self.kind == TableKind::Rows {
            if let Some(key) = self.key {
                self.keys.insert(row[key].trim().to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn key_field(&self) -> Option<&FieldDefinition> {
        self.key.and_then(|i| self.fields.get(i))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Class name used by code backends for one record of this table.
    pub fn struct_name(&self) -> String {
        match self.kind {
            TableKind::Rows => {
                let base = self.name.strip_suffix("Table").unwrap_or(&self.name);
                format!("{base}Struct")
            }
            TableKind::Singleton => format!("{}Struct", self.name),
            TableKind::Struct => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    enums: BTreeMap<String, EnumDefinition>,
    tables: BTreeMap<String, TableDefinition>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest sheets in order. Sheets with unknown suffixes are ignored.
    pub fn build(sheets: &[Sheet], diags: &mut Diagnostics) -> Self {
        let mut schema = Self::new();
        for sheet in sheets {
            schema.ingest(sheet, diags);
        }
        schema
    }

    pub fn ingest(&mut self, sheet: &Sheet, diags: &mut Diagnostics) {
        let Some(kind) = sheet.kind() else {
            tracing::debug!("Skipping sheet {}", sheet.name);
            return;
        };
        tracing::info!("Ingesting {}", sheet.name);
        match kind {
            SheetKind::Enum => self.ingest_enum(sheet, diags),
            SheetKind::Rows => self.ingest_table(sheet, TableKind::Rows, diags),
            SheetKind::Singleton => self.ingest_table(sheet, TableKind::Singleton, diags),
            SheetKind::Struct => self.ingest_table(sheet, TableKind::Struct, diags),
        }
    }

    /// Register an enum. The first definition of a name wins.
    pub fn add_enum(&mut self, def: EnumDefinition, diags: &mut Diagnostics) -> bool {
        if self.enums.contains_key(&def.name) {
            diags.report(&def.name, SchemaError::DuplicateDefinition);
            return false;
        }
        self.enums.insert(def.name.clone(), def);
        true
    }

    /// Register a table. The first definition of a name wins.
    pub fn add_table(&mut self, def: TableDefinition, diags: &mut Diagnostics) -> bool {
        if self.tables.contains_key(&def.name) {
            diags.report(&def.name, SchemaError::DuplicateDefinition);
            return false;
        }
        self.tables.insert(def.name.clone(), def);
        true
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.get(name)
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDefinition> {
        self.enums.values()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    fn ingest_enum(&mut self, sheet: &Sheet, diags: &mut Diagnostics) {
        if sheet.col_count() < 3 || sheet.row_count() < 3 {
            diags.report(&sheet.name, SchemaError::MalformedSheet { cols: 3, rows: 3 });
            return;
        }
        if self.enums.contains_key(&sheet.name) {
            diags.report(&sheet.name, SchemaError::DuplicateDefinition);
            return;
        }

        let mut def = EnumDefinition::new(&sheet.name, fold_lines(sheet.cell(DESCRIPTION_ROW, 0)));
        for row in FIRST_ENUM_ITEM_ROW..sheet.row_count() {
            let name = sheet.cell(row, 0).trim();
            let value = sheet.cell(row, 1).trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            let item = EnumItem {
                name: name.to_string(),
                value: value.to_string(),
                description: fold_lines(sheet.cell(row, 2)),
            };
            if !def.push(item) {
                diags.report(&sheet.name, SchemaError::DuplicateItem(name.to_string()));
            }
        }
        self.add_enum(def, diags);
    }

    fn ingest_table(&mut self, sheet: &Sheet, kind: TableKind, diags: &mut Diagnostics) {
        if sheet.col_count() < 2 || sheet.row_count() < FIRST_DATA_ROW {
            diags.report(
                &sheet.name,
                SchemaError::MalformedSheet {
                    cols: 2,
                    rows: FIRST_DATA_ROW,
                },
            );
            return;
        }
        if self.tables.contains_key(&sheet.name) {
            diags.report(&sheet.name, SchemaError::DuplicateDefinition);
            return;
        }

        let mut table = TableDefinition::new(&sheet.name, kind);
        table.description = fold_lines(sheet.cell(DESCRIPTION_ROW, 0));

        for col in 0..sheet.col_count() {
            let field = read_field(sheet, col, table.key.is_some(), diags);
            table.push_field(field);
        }

        if kind == TableKind::Rows && table.key.is_none() {
            diags.report(&sheet.name, SchemaError::MissingKey);
            return;
        }

        if kind != TableKind::Struct {
            for row in FIRST_DATA_ROW..sheet.row_count() {
                let cells = (0..table.fields.len())
                    .map(|col| sheet.cell(row, col).to_string())
                    .collect();
                table.push_row(cells);
                if kind == TableKind::Singleton {
                    break;
                }
            }
        }

        self.add_table(table, diags);
    }
}

fn read_field(sheet: &Sheet, col: usize, key_taken: bool, diags: &mut Diagnostics) -> FieldDefinition {
    let name = sheet.cell(NAME_ROW, col).trim();
    let subject = if name.is_empty() {
        format!("{} column {}", sheet.name, col + 1)
    } else {
        format!("{}.{}", sheet.name, name)
    };

    let token = sheet.cell(TYPE_ROW, col);
    let full_type = types::resolve(token).unwrap_or_else(|| {
        diags.report(&subject, SchemaError::InvalidType(token.to_string()));
        String::new()
    });

    let mut field = FieldDefinition::new(name, &full_type);
    field.description = fold_lines(sheet.cell(FIELD_DESCRIPTION_ROW, col));

    let context = ColumnContext {
        subject: &subject,
        field_type: &field.field_type,
        is_array: field.is_array,
        key_taken,
    };
    let constraints = constraint::parse(sheet.cell(CONSTRAINT_ROW, col), &context, diags);
    field.is_key = constraints.key;
    field.visibility = constraints.visibility;
    field.length = constraints.length;
    field.range = constraints.range;
    field.foreign_table = constraints.foreign_table;

    if field.is_inert() {
        tracing::debug!("{} is inert", subject);
    }
    field
}

/// Collapse line breaks in descriptive cells to spaces.
fn fold_lines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', " ").trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::diagnostics::Problem;

    pub(crate) fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    /// Build a table sheet from header rows and data rows.
    pub(crate) fn table_sheet(
        name: &str,
        constraints: &[&str],
        types: &[&str],
        names: &[&str],
        data: &[&[&str]],
    ) -> Sheet {
        let mut rows = vec![
            vec![format!("{name} description")],
            names.iter().map(|n| format!("{n} doc")).collect(),
            row(constraints),
            row(types),
            row(names),
        ];
        rows.extend(data.iter().map(|r| row(r)));
        Sheet::new(name, rows)
    }

    pub(crate) fn enum_sheet(name: &str, items: &[(&str, &str)]) -> Sheet {
        let mut rows = vec![row(&["Colors"]), row(&["Name", "Value", "Desc"])];
        rows.extend(items.iter().map(|&(n, v)| row(&[n, v, "item"])));
        Sheet::new(name, rows)
    }

    #[test]
    fn test_ingest_row_table() {
        let sheet = table_sheet(
            "HeroTable",
            &["K", "A;L[1,8]", "S;R[1,99]", ""],
            &["int", "string", "int32", ""],
            &["Id", "Name", "Level", ""],
            &[&["1", "Hero", "150"], &["2", "Villain", "10"], &["1", "Again", "5"]],
        );
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[sheet], &mut diags);
        assert!(diags.is_empty());

        let table = schema.table("HeroTable").unwrap();
        assert_eq!(table.kind, TableKind::Rows);
        assert_eq!(table.description, "HeroTable description");
        assert_eq!(table.key, Some(0));
        assert_eq!(table.fields.len(), 4);
        assert!(table.fields[3].is_inert());
        assert_eq!(table.fields[1].length, Some(Bound::Between(1.0, 8.0)));
        assert_eq!(table.fields[2].visibility, Some(Visibility::Server));
        assert_eq!(table.rows.len(), 3);
        // a repeated key keeps every row
        assert_eq!(table.rows[2][1], "Again");
        assert!(table.has_key("1"));
        assert!(table.has_key("2"));
        assert!(!table.has_key("3"));
        assert_eq!(table.struct_name(), "HeroStruct");
    }

    #[test]
    fn test_missing_key_skips_table() {
        let sheet = table_sheet("HeroTable", &["A", "A"], &["int", "string"], &["Id", "Name"], &[]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[sheet], &mut diags);
        assert!(schema.table("HeroTable").is_none());
        let all = diags.into_vec();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].problem, Problem::Schema(SchemaError::MissingKey));
    }

    #[test]
    fn test_singleton_and_struct_rows() {
        let settings = table_sheet(
            "GameSettings",
            &["A", "A"],
            &["int", "float"],
            &["MaxLevel", "Speed"],
            &[&["99", "1.5"], &["50", "2.0"]],
        );
        let template = table_sheet(
            "RewardStruct",
            &["A", "A"],
            &["int", "int"],
            &["ItemId", "Count"],
            &[&["1", "2"]],
        );
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[settings, template], &mut diags);
        assert!(diags.is_empty());

        let settings = schema.table("GameSettings").unwrap();
        assert_eq!(settings.rows.len(), 1);
        assert_eq!(settings.struct_name(), "GameSettingsStruct");
        let template = schema.table("RewardStruct").unwrap();
        assert!(template.rows.is_empty());
        assert_eq!(template.struct_name(), "RewardStruct");
    }

    #[test]
    fn test_invalid_type_clears_field() {
        let sheet = table_sheet("ItemTable", &["K", "A"], &["int", "date"], &["Id", "When"], &[]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[sheet], &mut diags);
        assert_eq!(diags.len(), 1);
        let field = schema.table("ItemTable").unwrap().field("When").unwrap();
        assert!(field.field_type.is_empty());
        assert!(field.is_inert());
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let first = enum_sheet("ColorEnum", &[("Red", "1")]);
        let second = enum_sheet("ColorEnum", &[("Blue", "2")]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[first, second], &mut diags);
        assert_eq!(diags.len(), 1);
        let colors = schema.enum_def("ColorEnum").unwrap();
        assert!(colors.item("Red").is_some());
        assert!(colors.item("Blue").is_none());
    }

    #[test]
    fn test_duplicate_table_first_wins() {
        let first = table_sheet("ItemTable", &["K", "A"], &["int", "string"], &["Id", "Name"], &[&["1", "Sword"]]);
        let second = table_sheet("ItemTable", &["K", "A"], &["int", "string"], &["Id", "Label"], &[&["2", "Shield"]]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[first, second], &mut diags);

        let all = diags.into_vec();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subject, "ItemTable");
        assert_eq!(all[0].problem, Problem::Schema(SchemaError::DuplicateDefinition));

        let items = schema.table("ItemTable").unwrap();
        assert!(items.field("Name").is_some());
        assert!(items.field("Label").is_none());
        assert!(items.has_key("1"));
        assert!(!items.has_key("2"));
    }

    #[test]
    fn test_ingest_enum() {
        let sheet = enum_sheet("ColorEnum", &[("Red", "1"), ("", "2"), ("Green", ""), ("Blue", " 3 "), ("Red", "4")]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[sheet], &mut diags);
        assert_eq!(diags.len(), 1);

        let colors = schema.enum_def("ColorEnum").unwrap();
        assert_eq!(colors.items.len(), 2);
        assert_eq!(colors.item("Blue").unwrap().value, "3");
        assert_eq!(colors.item("Red").unwrap().value, "1");
        assert_eq!(colors.short_name(), "Color");
    }

    #[test]
    fn test_malformed_sheets() {
        let tiny = Sheet::new("ColorEnum", vec![row(&["only"])]);
        let short = Sheet::new("HeroTable", vec![row(&["a", "b"])]);
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&[tiny, short], &mut diags);
        assert_eq!(diags.len(), 2);
        assert_eq!(schema.enums().count(), 0);
        assert_eq!(schema.tables().count(), 0);
    }

    #[test]
    fn test_visibility() {
        let mut field = FieldDefinition::new("Hp", "int32");
        assert!(!field.visible_to(Visibility::Server));
        field.visibility = Some(Visibility::Client);
        assert!(field.visible_to(Visibility::Client));
        assert!(!field.visible_to(Visibility::Server));
        field.visibility = Some(Visibility::All);
        assert!(field.visible_to(Visibility::Server));

        let key = FieldDefinition {
            is_key: true,
            ..FieldDefinition::new("Id", "int32")
        };
        assert!(key.visible_to(Visibility::Client));
    }

    #[test]
    fn test_description_folding() {
        assert_eq!(fold_lines(" line one\r\nline two\n"), "line one line two");
    }
}
