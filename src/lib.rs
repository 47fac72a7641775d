pub mod backend;
pub mod coerce;
pub mod compile;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod schema;
pub mod sheet;
pub mod types;
pub mod validate;
pub mod value;

use wasm_bindgen::prelude::*;

use backend::{Artifact, Json};
use compile::Compilation;
use config::{Config, parse_audience};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Compile a JSON workbook into JSON data documents.
///
/// Returns the generated files and every diagnostic message.
pub fn compile_workbook_json(
    workbook: &str,
    audience: Option<&str>,
) -> Result<(Vec<Artifact>, Vec<String>), String> {
    let sheets = sheet::parse_workbook(workbook).map_err(|e| e.to_string())?;
    let mut config = Config::default();
    if let Some(tag) = audience {
        config.audience = parse_audience(tag)?;
    }

    let mut compilation = Compilation::from_sheets(&sheets);
    let artifacts = compilation.emit(&Json, &config);
    let messages = compilation.diagnostics.iter().map(|d| d.to_string()).collect();
    Ok((artifacts, messages))
}

/// Compile a JSON workbook to `{ files: { name: contents }, diagnostics: [..] }`
#[wasm_bindgen(js_name = "compileWorkbook")]
pub fn compile_workbook(workbook: &str, audience: Option<String>) -> Result<js_sys::Object, String> {
    let (artifacts, messages) = compile_workbook_json(workbook, audience.as_deref())?;

    let files = js_sys::Object::new();
    for artifact in &artifacts {
        js_sys::Reflect::set(
            &files,
            &JsValue::from_str(&artifact.file_name),
            &JsValue::from_str(&artifact.contents),
        )
        .map_err(|_| format!("Failed to store {}", artifact.file_name))?;
    }

    let diagnostics: js_sys::Array = messages.iter().map(|m| JsValue::from_str(m)).collect();

    let result = js_sys::Object::new();
    js_sys::Reflect::set(&result, &JsValue::from_str("files"), &files)
        .map_err(|_| "Failed to build result".to_string())?;
    js_sys::Reflect::set(&result, &JsValue::from_str("diagnostics"), &diagnostics)
        .map_err(|_| "Failed to build result".to_string())?;
    Ok(result)
}
