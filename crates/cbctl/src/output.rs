//! Rendering command results as JSON, YAML or tables

use anyhow::{Context, Result};
use comfy_table::Table;
use jpx_core::Runtime;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Global JMESPath runtime with extended functions
static JMESPATH_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the JMESPath runtime with extended functions
pub fn get_jmespath_runtime() -> &'static Runtime {
    JMESPATH_RUNTIME.get_or_init(|| Runtime::builder().with_all_extensions().build())
}

/// Quote bare backtick literals so `` `foo` `` means the string `"foo"`.
///
/// JMESPath allows elided quotes inside backticks but the compiler wants
/// JSON. Content that already parses as JSON is left alone.
fn normalize_backtick_literals(query: &str) -> String {
    static BACKTICK_RE: OnceLock<Regex> = OnceLock::new();
    let re = BACKTICK_RE.get_or_init(|| {
        Regex::new(r"`([^`\\]*(?:\\.[^`\\]*)*)`").expect("backtick pattern is valid")
    });

    re.replace_all(query, |caps: &regex::Captures| {
        let content = &caps[1];
        let trimmed = content.trim();

        if serde_json::from_str::<Value>(trimmed).is_ok() {
            format!("`{}`", content)
        } else {
            let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
            format!("`\"{}\"`", escaped)
        }
    })
    .into_owned()
}

/// Compile a JMESPath expression using the extended runtime
pub fn compile_jmespath(
    query: &str,
) -> Result<jpx_core::Expression<'static>, jpx_core::JmespathError> {
    let normalized = normalize_backtick_literals(query);
    get_jmespath_runtime().compile(&normalized)
}

/// Apply an optional JMESPath query to a JSON value
pub fn apply_query(value: Value, query: Option<&str>) -> Result<Value> {
    match query {
        Some(query_str) => {
            let expr = compile_jmespath(query_str)
                .with_context(|| format!("Invalid JMESPath expression: {}", query_str))?;
            expr.search(&value).context("JMESPath query failed")
        }
        None => Ok(value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// JSON, or a command-specific table for listings
    #[default]
    Auto,
    Json,
    Yaml,
    Table,
}

impl OutputFormat {
    /// Concrete format for a command whose natural rendering is `fallback`
    pub fn or(self, fallback: OutputFormat) -> OutputFormat {
        match self {
            OutputFormat::Auto => fallback,
            other => other,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }
}

pub fn print_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    let json_value = apply_query(serde_json::to_value(data)?, query)?;

    match format {
        OutputFormat::Auto | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            println!("{}", render_table(&json_value));
        }
    }

    Ok(())
}

/// Generic table rendering: arrays of objects become rows, objects become
/// key/value pairs
pub fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_backtick_unquoted_string() {
        assert_eq!(
            normalize_backtick_literals(r#"[?name==`travel-sample`]"#),
            r#"[?name==`"travel-sample"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_json_untouched() {
        for query in [
            r#"[?name==`"default"`]"#,
            r#"[?replicaNumber==`1`]"#,
            r#"[?flush==`true`]"#,
            r#"[?password==`null`]"#,
        ] {
            assert_eq!(normalize_backtick_literals(query), query);
        }
    }

    #[test]
    fn test_normalize_multiple_backticks() {
        assert_eq!(
            normalize_backtick_literals(r#"[?name==`foo` && bucketType==`membase`]"#),
            r#"[?name==`"foo"` && bucketType==`"membase"`]"#
        );
    }

    #[test]
    fn test_query_filters_bucket_list() {
        let buckets = json!([
            {"name": "default", "bucketType": "membase"},
            {"name": "cache", "bucketType": "memcached"}
        ]);
        let names = apply_query(buckets, Some("[?bucketType==`memcached`].name")).unwrap();
        assert_eq!(names, json!(["cache"]));
    }

    #[test]
    fn test_invalid_query_is_an_error() {
        let err = apply_query(json!({}), Some("[?")).unwrap_err();
        assert!(err.to_string().contains("Invalid JMESPath expression"));
    }

    #[test]
    fn test_auto_falls_back() {
        assert_eq!(OutputFormat::Auto.or(OutputFormat::Table), OutputFormat::Table);
        assert_eq!(OutputFormat::Yaml.or(OutputFormat::Table), OutputFormat::Yaml);
    }

    #[test]
    fn test_render_table_object() {
        let rendered = render_table(&json!({"name": "default", "nodes": [1, 2]}));
        assert!(rendered.contains("default"));
        assert!(rendered.contains("[2 items]"));
    }
}
