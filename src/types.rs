//! Field type grammar: terse sheet type tokens to canonical type names.

pub const ARRAY_MARKER: &str = "[]";

/// Resolve a raw type token to its canonical name.
///
/// Returns `None` when the token is not part of the grammar. An empty token
/// resolves to an empty name, which marks an unused column.
pub fn resolve(token: &str) -> Option<String> {
    let token = token.trim();
    let (marker, base) = match token.strip_prefix(ARRAY_MARKER) {
        Some(rest) => (ARRAY_MARKER, rest.trim()),
        None => ("", token),
    };

    if base.is_empty() {
        return Some(String::new());
    }

    let canonical = match map_scalar(&base.to_lowercase()) {
        Some(scalar) => scalar.to_string(),
        None if is_user_type(base) => base.to_string(),
        None => return None,
    };

    Some(format!("{marker}{canonical}"))
}

/// Split a canonical name into its array flag and element type.
pub fn split_array(full: &str) -> (bool, &str) {
    match full.strip_prefix(ARRAY_MARKER) {
        Some(element) => (true, element),
        None => (false, full),
    }
}

fn map_scalar(lower: &str) -> Option<&'static str> {
    let canonical = match lower {
        // "int8" lands on string, kept as is for sheet compatibility
        "string" | "int8" => "string",
        "bool" | "boolean" => "bool",
        "byte" | "uint8" => "uint8",
        "short" | "int16" => "int16",
        "ushort" | "uint16" => "uint16",
        "int" | "int32" => "int32",
        "uint" | "uint32" => "uint32",
        "long" | "int64" => "int64",
        "ulong" | "uint64" => "uint64",
        "float" | "float32" => "float32",
        "double" | "number" | "float64" => "float64",
        _ => return None,
    };
    Some(canonical)
}

fn is_user_type(name: &str) -> bool {
    (name.ends_with("Enum") && name.len() > "Enum".len())
        || (name.ends_with("Struct") && name.len() > "Struct".len())
}

/// Scalar categories the coercion engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    String,
    Float,
    Unsigned,
    Signed,
}

impl ScalarKind {
    /// Classify a canonical scalar name. Anything unrecognized falls into
    /// the signed integer rules.
    pub fn of(canonical: &str) -> Self {
        match canonical {
            "bool" => Self::Bool,
            "string" => Self::String,
            "float32" | "float64" => Self::Float,
            "uint8" | "uint16" | "uint32" | "uint64" => Self::Unsigned,
            _ => Self::Signed,
        }
    }
}
