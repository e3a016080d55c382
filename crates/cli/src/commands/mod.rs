pub mod endpoints;
pub mod key;
pub mod url;

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;
use typed_hooks_contract::ContractIndex;

/// Run a command body, printing its error and mapping the outcome to an exit code.
pub fn run_command<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Load and index an OpenAPI JSON document.
pub fn read_contract(path: &Path) -> Result<ContractIndex, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let index = ContractIndex::from_json(&json)
        .map_err(|e| format!("Invalid contract {}: {e}", path.display()))?;
    debug!(path = %path.display(), endpoints = index.len(), "Loaded contract.");
    Ok(index)
}

/// Value parser for JSON arguments.
pub fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Value parser for arguments that must be a JSON object.
pub fn parse_object(s: &str) -> Result<Map<String, Value>, String> {
    match parse_json(s)? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {other}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        assert_eq!(parse_object(r#"{"id":1}"#).unwrap()["id"], json!(1));
        assert!(parse_object("[1]").unwrap_err().contains("expected a JSON object"));
        assert!(parse_object("{").unwrap_err().starts_with("invalid JSON"));
    }

    #[test]
    fn test_run_command_exit_codes() {
        assert_eq!(run_command(|| Ok(())), 0);
        assert_eq!(run_command(|| Err("boom".to_string())), 1);
    }

    #[test]
    fn test_read_contract_reports_missing_file() {
        let err = read_contract(Path::new("/nonexistent/contract.json")).unwrap_err();
        assert!(err.starts_with("Failed to read"));
    }
}
