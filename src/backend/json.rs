//! JSON data documents, one file per row table or singleton config.

use super::Backend;
use crate::compile;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::schema::SchemaModel;

pub struct Json;

impl Backend for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn file_name(&self, def_name: &str) -> Option<String> {
        if def_name.ends_with("Enum") || def_name.ends_with("Struct") {
            return None;
        }
        Some(format!("{def_name}.json"))
    }

    fn emit_enum(&self, _schema: &SchemaModel, _name: &str, _diags: &mut Diagnostics) -> Option<String> {
        None
    }

    fn emit_table(
        &self,
        schema: &SchemaModel,
        name: &str,
        config: &Config,
        diags: &mut Diagnostics,
    ) -> Option<String> {
        compile::compile_table(schema, name, config.audience, diags).map(|doc| doc.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::{enum_sheet, table_sheet};

    #[test]
    fn test_file_names() {
        assert_eq!(Json.file_name("HeroTable").as_deref(), Some("HeroTable.json"));
        assert_eq!(Json.file_name("GameSettings").as_deref(), Some("GameSettings.json"));
        assert_eq!(Json.file_name("ColorEnum"), None);
        assert_eq!(Json.file_name("RewardStruct"), None);
    }

    #[test]
    fn test_emit_table_with_enum_and_struct() {
        let sheets = [
            enum_sheet("ClassEnum", &[("Warrior", "1"), ("Mage", "2")]),
            table_sheet(
                "RewardStruct",
                &["A", "A"],
                &["int", "int"],
                &["ItemId", "Count"],
                &[],
            ),
            table_sheet(
                "HeroTable",
                &["K", "A", "A"],
                &["int", "ClassEnum", "[]RewardStruct"],
                &["Id", "Class", "Rewards"],
                &[&["1", "Mage", "[[100, 2]]"]],
            ),
        ];
        let mut diags = Diagnostics::new();
        let schema = SchemaModel::build(&sheets, &mut diags);

        let text = Json
            .emit_table(&schema, "HeroTable", &Config::default(), &mut diags)
            .unwrap();
        assert_eq!(text, r#"[{"Id":1,"Class":2,"Rewards":[{"ItemId":100,"Count":2}]}]"#);
        assert!(diags.is_empty());

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["Rewards"][0]["Count"], 2);
    }
}
