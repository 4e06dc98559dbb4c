//! Helpers shared by the command handlers

use anyhow::Context;
use dialoguer::Confirm;
use serde_json::Value;
use std::io::IsTerminal;

use crate::error::{CbctlError, Result as CliResult};

/// Ask the user to confirm a destructive action.
///
/// Without a terminal on stdin nothing can be confirmed, so the action is
/// refused and the user is pointed at `--force`.
pub fn confirm_action(message: &str) -> CliResult<bool> {
    if std::io::stdin().is_terminal() {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to get user confirmation")?)
    } else {
        eprintln!("Warning: {} Use --force to skip confirmation.", message);
        Ok(false)
    }
}

/// Read JSON data from string, file, or stdin
pub fn read_json_data(data: &str) -> CliResult<Value> {
    let json_str = if data == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else if let Some(file_path) = data.strip_prefix('@') {
        std::fs::read_to_string(file_path).map_err(|e| CbctlError::FileError {
            path: file_path.to_string(),
            message: e.to_string(),
        })?
    } else {
        data.to_string()
    };

    serde_json::from_str(&json_str).map_err(|e| CbctlError::InvalidInput {
        message: format!("Invalid JSON: {}", e),
    })
}

/// Split `key=value` form arguments
pub fn parse_form_fields(fields: &[String]) -> CliResult<Vec<(String, String)>> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| CbctlError::InvalidInput {
                    message: format!("form field '{}' is not key=value", field),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_read_inline_json() {
        assert_eq!(read_json_data(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_read_json_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["x"]"#).unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(read_json_data(&arg).unwrap(), json!(["x"]));
    }

    #[test]
    fn test_missing_file_is_a_file_error() {
        let err = read_json_data("@/nonexistent/body.json").unwrap_err();
        assert!(matches!(err, CbctlError::FileError { .. }));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            read_json_data("{nope"),
            Err(CbctlError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_form_fields() {
        let fields = vec!["ramQuotaMB=256".to_string(), "saslPassword=".to_string()];
        assert_eq!(
            parse_form_fields(&fields).unwrap(),
            vec![
                ("ramQuotaMB".to_string(), "256".to_string()),
                ("saslPassword".to_string(), String::new())
            ]
        );
        assert!(parse_form_fields(&["=x".to_string()]).is_err());
        assert!(parse_form_fields(&["novalue".to_string()]).is_err());
    }
}
