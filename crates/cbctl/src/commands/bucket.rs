//! Bucket commands

use std::time::Duration;

use anyhow::Context;
use cbctl_core::readiness::{self, DEFAULT_POLL_INTERVAL};
use cbctl_core::{BucketChanges, BucketInfo, BucketSpec, ReadinessCallback, ReadinessEvent};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{debug, info};

use super::CommandContext;
use super::utils::confirm_action;
use crate::cli::BucketCommands;
use crate::error::{CbctlError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub async fn handle_bucket_command(
    ctx: &CommandContext<'_>,
    command: &BucketCommands,
) -> CliResult<()> {
    match command {
        BucketCommands::List => handle_list(ctx).await,
        BucketCommands::Info { name } => handle_info(ctx, name).await,
        BucketCommands::Create {
            name,
            bucket_type,
            ram_quota,
            password,
            replicas,
            flush,
            wait,
            timeout,
        } => {
            let mut spec = BucketSpec::new(name.as_str(), *ram_quota)
                .bucket_type(*bucket_type)
                .flush_enabled(*flush);
            if let Some(password) = password {
                spec = spec.password(password.as_str());
            }
            if let Some(replicas) = replicas {
                spec = spec.replicas(*replicas);
            }
            let wait = wait.then(|| Duration::from_secs(*timeout));
            handle_create(ctx, &spec, wait).await
        }
        BucketCommands::Update {
            name,
            password,
            replicas,
            ram_quota,
            flush,
        } => {
            let changes = BucketChanges {
                password: password.clone(),
                replicas: *replicas,
                ram_quota_mb: *ram_quota,
                flush_enabled: *flush,
            };
            handle_update(ctx, name, &changes).await
        }
        BucketCommands::Remove { name, force } => handle_remove(ctx, name, *force).await,
        BucketCommands::Wait {
            name,
            timeout,
            interval,
        } => {
            handle_wait(
                ctx,
                name,
                Duration::from_secs(*timeout),
                Duration::from_millis(*interval),
            )
            .await
        }
    }
}

async fn handle_list(ctx: &CommandContext<'_>) -> CliResult<()> {
    let client = ctx.client().await?;
    let buckets = client.buckets_list().await?;
    debug!("Listed {} buckets", buckets.len());

    match ctx.output.or(OutputFormat::Table) {
        OutputFormat::Table if ctx.query.is_none() => println!("{}", bucket_table(&buckets)),
        format => print_output(&buckets, format, ctx.query)?,
    }
    client.close();
    Ok(())
}

async fn handle_info(ctx: &CommandContext<'_>, name: &str) -> CliResult<()> {
    let client = ctx.client().await?;
    let bucket = client.bucket_info(name).await?;

    match ctx.output.or(OutputFormat::Table) {
        OutputFormat::Table if ctx.query.is_none() => {
            println!("{}", bucket_table(std::slice::from_ref(&bucket)));
            if !bucket.nodes.is_empty() {
                println!("{}", node_table(&bucket));
            }
        }
        format => print_output(&bucket, format, ctx.query)?,
    }
    client.close();
    Ok(())
}

async fn handle_create(
    ctx: &CommandContext<'_>,
    spec: &BucketSpec,
    wait: Option<Duration>,
) -> CliResult<()> {
    let client = ctx.client().await?;
    client.bucket_create(spec).await?;
    info!("Bucket '{}' created", spec.name());

    let ready = match wait {
        Some(timeout) => {
            wait_with_spinner(&client, spec.name(), timeout, DEFAULT_POLL_INTERVAL).await?;
            Some(true)
        }
        None => None,
    };

    report(
        ctx,
        json!({
            "bucket": spec.name(),
            "type": spec.kind().as_str(),
            "ramQuotaMB": spec.ram_quota_mb(),
            "status": "created",
            "ready": ready,
        }),
        &format!("Bucket '{}' created.", spec.name()),
    )?;
    client.close();
    Ok(())
}

async fn handle_update(
    ctx: &CommandContext<'_>,
    name: &str,
    changes: &BucketChanges,
) -> CliResult<()> {
    if changes.is_empty() {
        return Err(CbctlError::InvalidInput {
            message: "nothing to update; pass at least one setting".to_string(),
        });
    }

    let client = ctx.client().await?;
    let current = client.bucket_info(name).await?;
    client.bucket_update(name, &current, changes).await?;

    report(
        ctx,
        json!({"bucket": name, "status": "updated"}),
        &format!("Bucket '{}' updated.", name),
    )?;
    client.close();
    Ok(())
}

async fn handle_remove(ctx: &CommandContext<'_>, name: &str, force: bool) -> CliResult<()> {
    if !force && !confirm_action(&format!("Remove bucket '{}' and all of its data?", name))? {
        println!("Bucket removal cancelled.");
        return Ok(());
    }

    let client = ctx.client().await?;
    client.bucket_remove(name).await?;

    report(
        ctx,
        json!({"bucket": name, "status": "removed"}),
        &format!("Bucket '{}' removed.", name),
    )?;
    client.close();
    Ok(())
}

async fn handle_wait(
    ctx: &CommandContext<'_>,
    name: &str,
    timeout: Duration,
    interval: Duration,
) -> CliResult<()> {
    let client = ctx.client().await?;
    let bucket = wait_with_spinner(&client, name, timeout, interval).await?;

    report(
        ctx,
        json!({
            "bucket": name,
            "ready": true,
            "nodes": bucket.nodes.len(),
        }),
        &format!("Bucket '{}' is ready ({}).", name, bucket.health_summary()),
    )?;
    client.close();
    Ok(())
}

async fn wait_with_spinner(
    client: &cbctl_core::AdminClient,
    bucket: &str,
    timeout: Duration,
    interval: Duration,
) -> CliResult<BucketInfo> {
    let (pb, callback) = readiness_spinner(bucket)?;
    let result = readiness::wait_ready(client, bucket, timeout, interval, Some(callback)).await;
    if !pb.is_finished() {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Spinner on stderr driven by readiness events
fn readiness_spinner(bucket: &str) -> CliResult<(ProgressBar, ReadinessCallback)> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .context("Invalid spinner template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Waiting for bucket '{}'", bucket));

    let pb_clone = pb.clone();
    let callback: ReadinessCallback = Box::new(move |event| match event {
        ReadinessEvent::Started { .. } => {}
        ReadinessEvent::Polling {
            bucket, attempt, ..
        } => pb_clone.set_message(format!("Waiting for bucket '{}' (attempt {})", bucket, attempt)),
        ReadinessEvent::NotYetAvailable { bucket, reason } => {
            pb_clone.set_message(format!("Bucket '{}' not ready: {}", bucket, reason))
        }
        ReadinessEvent::Ready { bucket, elapsed } => pb_clone.finish_with_message(format!(
            "Bucket '{}' ready after {:.1}s",
            bucket,
            elapsed.as_secs_f64()
        )),
        ReadinessEvent::TimedOut { bucket, elapsed } => pb_clone.abandon_with_message(format!(
            "Bucket '{}' still not ready after {:.1}s",
            bucket,
            elapsed.as_secs_f64()
        )),
    });

    Ok((pb, callback))
}

/// Print a one-line confirmation, or the structured result for json/yaml
fn report(ctx: &CommandContext<'_>, data: serde_json::Value, message: &str) -> CliResult<()> {
    if ctx.output.is_structured() || ctx.query.is_some() {
        print_output(data, ctx.output.or(OutputFormat::Json), ctx.query)?;
    } else {
        println!("{}", message);
    }
    Ok(())
}

fn bucket_table(buckets: &[BucketInfo]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["NAME", "TYPE", "RAM (MB)", "REPLICAS", "HEALTH"]);
    for bucket in buckets {
        table.add_row(vec![
            bucket.name.clone(),
            bucket.bucket_type.clone().unwrap_or_else(|| "-".to_string()),
            bucket
                .ram_quota_mb()
                .map(|mb| mb.to_string())
                .unwrap_or_else(|| "-".to_string()),
            bucket
                .replica_number
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            bucket.health_summary(),
        ]);
    }
    table
}

fn node_table(bucket: &BucketInfo) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["NODE", "STATUS"]);
    for node in &bucket.nodes {
        table.add_row(vec![node.hostname.clone(), node.status.clone()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(statuses: &[&str]) -> BucketInfo {
        let nodes: Vec<_> = statuses
            .iter()
            .map(|s| json!({"hostname": "10.0.0.1:8091", "status": s}))
            .collect();
        serde_json::from_value(json!({
            "name": "travel",
            "bucketType": "membase",
            "replicaNumber": 1,
            "quota": {"ram": 268435456u64, "rawRAM": 268435456u64},
            "nodes": nodes,
        }))
        .unwrap()
    }

    #[test]
    fn test_bucket_table_columns() {
        let rendered = bucket_table(&[info(&["healthy", "warmup"])]).to_string();
        assert!(rendered.contains("travel"));
        assert!(rendered.contains("membase"));
        assert!(rendered.contains("256"));
        assert!(rendered.contains("1/2 nodes healthy"));
    }

    #[test]
    fn test_node_table_lists_status() {
        let rendered = node_table(&info(&["warmup"])).to_string();
        assert!(rendered.contains("warmup"));
    }
}
