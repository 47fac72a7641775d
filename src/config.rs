//! Run configuration, passed explicitly to every stage that needs it.

use crate::backend::BackendKind;
use crate::constraint::Visibility;
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "GameConfig";

/// One backend and the directory its artifacts go to.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub kind: BackendKind,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sheet directory or single sheet file.
    pub input: PathBuf,
    /// Fields tagged with this audience (or `A`) are emitted.
    pub audience: Visibility,
    pub outputs: Vec<Output>,
    /// Namespace for generated C# code.
    pub namespace: String,
    /// Exit non-zero when any diagnostic was reported.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./sheets"),
            audience: Visibility::Server,
            outputs: Vec::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            strict: false,
        }
    }
}

/// Parse an audience tag (`S`, `C` or `A`), case-insensitive.
pub fn parse_audience(tag: &str) -> Result<Visibility, String> {
    Visibility::from_tag(&tag.trim().to_uppercase())
        .ok_or_else(|| format!("Invalid audience: {tag} (expected S, C or A)"))
}
