//! Loading the initial context for `laminar run`.

use std::{fs, path::Path};

use anyhow::{Context as _, Result, bail};
use laminar_engine::Context;
use serde_json::Value;

/// Reads a JSON or YAML mapping into a fresh context.
///
/// `.yaml`/`.yml` files are parsed as YAML; anything else as JSON.
pub fn load_context(path: &Path) -> Result<Context> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let value: Value = if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML input: {}", path.display()))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON input: {}", path.display()))?
    };

    Context::try_from(value).with_context(|| format!("Input file must contain a mapping: {}", path.display()))
}

/// Parses a `KEY=VALUE` override.
///
/// The value is read as JSON when it parses (`amount=12.5`, `digital=true`,
/// `items=["book"]`) and kept as a plain string otherwise (`email=a@b.c`).
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("missing key in '{raw}'");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn loads_yaml_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().expect("create temp file");
        writeln!(file, "order_id: 17\nitems:\n  - book\n  - lamp").expect("write yaml");

        let ctx = load_context(file.path()).expect("valid yaml mapping");

        assert_eq!(ctx.get("order_id"), Some(&json!(17)));
        assert_eq!(ctx.get("items"), Some(&json!(["book", "lamp"])));
        assert!(!ctx.is_halted());
    }

    #[test]
    fn loads_json_by_default() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("order.input");
        fs::write(&path, r#"{"order_id": "A-1", "digital": true}"#).expect("write json");

        let ctx = load_context(&path).expect("valid json object");

        assert_eq!(ctx.get_str("order_id"), Some("A-1"));
        assert!(ctx.is_truthy("digital"));
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").expect("write json");

        let err = load_context(&path).expect_err("arrays are rejected");

        assert!(err.to_string().contains("must contain a mapping"));
    }

    #[test]
    fn reports_missing_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_context(&dir.path().join("absent.json")).expect_err("file does not exist");
        assert!(err.to_string().starts_with("Failed to read input file"));
    }

    #[test]
    fn assignments_parse_json_with_string_fallback() {
        assert_eq!(parse_assignment("amount=12.5").expect("valid"), ("amount".to_string(), json!(12.5)));
        assert_eq!(parse_assignment("items=[\"book\"]").expect("valid"), ("items".to_string(), json!(["book"])));
        assert_eq!(parse_assignment("email=a@b.c").expect("valid"), ("email".to_string(), json!("a@b.c")));
        assert_eq!(parse_assignment(" note = x=y").expect("valid"), ("note".to_string(), json!(" x=y")));
    }

    #[test]
    fn assignments_need_a_key_and_separator() {
        assert!(parse_assignment("no_separator").is_err());
        assert!(parse_assignment("=value").is_err());
    }
}
