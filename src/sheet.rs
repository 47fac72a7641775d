//! Raw sheets: a name plus rows of cell text.
//!
//! The compiler never sees spreadsheet files directly. Sheets come from CSV
//! files (one sheet per file, named after the file stem) or from a JSON
//! workbook holding several sheets.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Workbook error: {0}")]
    Workbook(#[from] serde_json::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Sheet file has no usable name: {0}")]
    Unnamed(PathBuf),
}

/// How a sheet is ingested, decided by its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Enum,
    /// `...Table`: many keyed rows.
    Rows,
    /// `...Settings`: a single record from the first data row.
    Singleton,
    /// `...Struct`: field shape only.
    Struct,
}

impl SheetKind {
    pub fn classify(name: &str) -> Option<Self> {
        if name.ends_with("Enum") {
            Some(Self::Enum)
        } else if name.ends_with("Settings") {
            Some(Self::Singleton)
        } else if name.ends_with("Struct") {
            Some(Self::Struct)
        } else if name.ends_with("Table") {
            Some(Self::Rows)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn kind(&self) -> Option<SheetKind> {
        SheetKind::classify(&self.name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row; ragged rows read as empty cells past their end.
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct Workbook {
    sheets: Vec<Sheet>,
}

/// Parse a JSON workbook: `{"sheets": [{"name": "...", "rows": [["..."]]}]}`.
pub fn parse_workbook(text: &str) -> Result<Vec<Sheet>, SheetError> {
    let workbook: Workbook = serde_json::from_str(text)?;
    Ok(workbook.sheets)
}

pub fn load_csv(path: &Path) -> Result<Sheet, SheetError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SheetError::Unnamed(path.to_path_buf()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(Sheet::new(name, rows))
}

/// Load every sheet stored in one file.
pub fn load_file(path: &Path) -> Result<Vec<Sheet>, SheetError> {
    match extension(path).as_deref() {
        Some("json") => parse_workbook(&std::fs::read_to_string(path)?),
        _ => Ok(vec![load_csv(path)?]),
    }
}

/// Find sheet files under `input`, in file name order.
///
/// A plain file path is returned as is. Spreadsheet lock files (`~$...`) are
/// skipped.
pub fn discover(input: &Path) -> Result<Vec<PathBuf>, SheetError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let locked = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("~$"));
        let supported = matches!(extension(path).as_deref(), Some("csv" | "json"));
        if supported && !locked {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Sheets read from an input path, plus the files that could not be read.
#[derive(Debug, Default)]
pub struct Loaded {
    pub sheets: Vec<Sheet>,
    pub failures: Vec<(PathBuf, SheetError)>,
}

/// Discover and load all sheets. A file that fails to load is kept in
/// `failures` and the rest still load.
pub fn load_all(input: &Path) -> Result<Loaded, SheetError> {
    let mut loaded = Loaded::default();
    for path in discover(input)? {
        tracing::info!("Loading {}", path.display());
        match load_file(&path) {
            Ok(sheets) => loaded.sheets.extend(sheets),
            Err(e) => loaded.failures.push((path, e)),
        }
    }
    Ok(loaded)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SheetKind::classify("ColorEnum"), Some(SheetKind::Enum));
        assert_eq!(SheetKind::classify("HeroTable"), Some(SheetKind::Rows));
        assert_eq!(SheetKind::classify("GameSettings"), Some(SheetKind::Singleton));
        assert_eq!(SheetKind::classify("RewardStruct"), Some(SheetKind::Struct));
        assert_eq!(SheetKind::classify("Notes"), None);
    }

    #[test]
    fn test_cell_access() {
        let sheet = Sheet::new(
            "HeroTable",
            vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        );
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.cell(0, 1), "b");
        assert_eq!(sheet.cell(1, 1), "");
        assert_eq!(sheet.cell(9, 0), "");
    }

    #[test]
    fn test_parse_workbook() {
        let text = r#"{"sheets": [{"name": "ColorEnum", "rows": [["Colors"]]}, {"name": "EmptyTable"}]}"#;
        let sheets = parse_workbook(text).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].cell(0, 0), "Colors");
        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_load_csv_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("HeroTable.csv"), "Heroes\n\"a,b\",c\n").unwrap();
        std::fs::write(dir.path().join("~$HeroTable.csv"), "lock").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "skip").unwrap();

        let files = discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);

        let sheet = load_csv(&files[0]).unwrap();
        assert_eq!(sheet.name, "HeroTable");
        assert_eq!(sheet.cell(1, 0), "a,b");
        assert_eq!(sheet.cell(1, 1), "c");
    }

    #[test]
    fn test_load_all_keeps_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("HeroTable.csv"), b"Heroes\n\xff\xfe,x\n").unwrap();
        std::fs::write(dir.path().join("ItemTable.csv"), "Items\n").unwrap();
        std::fs::write(dir.path().join("book.json"), "{\"sheets\": [").unwrap();

        let loaded = load_all(dir.path()).unwrap();
        assert_eq!(loaded.sheets.len(), 1);
        assert_eq!(loaded.sheets[0].name, "ItemTable");

        let failed: Vec<_> = loaded
            .failures
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(failed, ["HeroTable.csv", "book.json"]);
        assert!(matches!(loaded.failures[0].1, SheetError::Csv(_)));
        assert!(matches!(loaded.failures[1].1, SheetError::Workbook(_)));
    }
}
