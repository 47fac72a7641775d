//! Output backends. Each one turns schema definitions into files for one target.

mod csharp;
mod json;

pub use csharp::CSharp;
pub use json::Json;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::schema::SchemaModel;

/// A generated file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Output file for a definition, or `None` when the backend emits nothing for it.
    fn file_name(&self, def_name: &str) -> Option<String>;

    fn emit_enum(&self, schema: &SchemaModel, name: &str, diags: &mut Diagnostics) -> Option<String>;

    fn emit_table(
        &self,
        schema: &SchemaModel,
        name: &str,
        config: &Config,
        diags: &mut Diagnostics,
    ) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Json,
    CSharp,
}

impl BackendKind {
    pub fn backend(&self, config: &Config) -> Box<dyn Backend> {
        match self {
            Self::Json => Box::new(Json),
            Self::CSharp => Box::new(CSharp::new(&config.namespace)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind() {
        let config = Config::default();
        assert_eq!(BackendKind::CSharp.backend(&config).name(), "csharp");
        assert_eq!(BackendKind::Json.backend(&config).name(), "json");
    }
}
