//! Connection string inspection

use cbctl_core::ConnectionString;
use comfy_table::Table;
use serde::Serialize;

use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

/// Parsed form of a connection string, as printed by `cbctl connstr`
#[derive(Debug, Serialize)]
struct ConnstrReport {
    scheme: &'static str,
    hosts: Vec<String>,
    bucket: Option<String>,
    options: Vec<(String, String)>,
    tls: bool,
    management_url: String,
    normalized: String,
}

fn report(input: &str) -> CliResult<ConnstrReport> {
    let parsed = ConnectionString::parse(input)?;
    let endpoint = parsed.endpoint()?;
    Ok(ConnstrReport {
        scheme: parsed.scheme.as_str(),
        hosts: parsed.hosts.iter().map(ToString::to_string).collect(),
        bucket: parsed.bucket.clone(),
        options: parsed.options.clone(),
        tls: endpoint.tls(),
        management_url: endpoint.base_url(),
        normalized: parsed.encode(),
    })
}

/// Parse `input` and show what the client would connect to
pub fn handle_connstr_command(
    input: &str,
    output: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let report = report(input)?;

    match output.or(OutputFormat::Table) {
        OutputFormat::Table if query.is_none() => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);
            table.add_row(vec!["scheme".to_string(), report.scheme.to_string()]);
            table.add_row(vec!["hosts".to_string(), report.hosts.join(", ")]);
            table.add_row(vec![
                "bucket".to_string(),
                report.bucket.clone().unwrap_or_else(|| "-".to_string()),
            ]);
            for (key, value) in &report.options {
                table.add_row(vec![format!("option {}", key), value.clone()]);
            }
            table.add_row(vec!["management url".to_string(), report.management_url.clone()]);
            table.add_row(vec!["normalized".to_string(), report.normalized.clone()]);
            println!("{}", table);
        }
        format => print_output(&report, format, query)?,
    }
    Ok(())
}
