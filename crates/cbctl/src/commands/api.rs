//! Raw API access commands for direct REST endpoint calls

use cbctl_core::{HttpMethod, RequestBody};
use tracing::debug;

use super::CommandContext;
use super::utils::{parse_form_fields, read_json_data};
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

/// Send one request to the management API and print the response body
pub async fn handle_api_command(
    ctx: &CommandContext<'_>,
    method: &str,
    path: &str,
    data: Option<&str>,
    form: &[String],
) -> CliResult<()> {
    // Reject a bad method before prompting for a password or connecting
    let parsed: HttpMethod = method.parse()?;

    let body = match data {
        Some(data) => Some(RequestBody::Json(read_json_data(data)?)),
        None if !form.is_empty() => Some(RequestBody::form(&parse_form_fields(form)?)?),
        None => None,
    };
    debug!("API request: {} {}", parsed, path);

    let client = ctx.client().await?;
    let result = client.http_request(path, method, body).await?;
    debug!("API response: HTTP {}", result.http_status());

    print_output(result.value(), ctx.output.or(OutputFormat::Json), ctx.query)?;
    client.close();
    Ok(())
}
