use anyhow::Result;
use cbctl_core::config::Config;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::CommandContext;
use connection::ConnectionManager;
use error::{CbctlError, CliDiagnostic};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path).map(|config| (config, Some(path)))
    } else {
        debug!("Loading config from default location");
        Config::load().map(|config| (config, None))
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            CliDiagnostic::error(&e.to_string())
                .detail("the configuration file could not be read")
                .tip("check the file, or point at another one:", &["cbctl --config-file <path> ..."])
                .print();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "cbctl=warn,cbctl_core=warn",
            1 => "cbctl=info,cbctl_core=info",
            2 => "cbctl=debug,cbctl_core=debug",
            _ => "cbctl=trace,cbctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), CbctlError> {
    info!("Command: {}", format_command(&cli.command));

    let ctx = CommandContext {
        conn_mgr,
        profile: cli.profile.as_deref(),
        connection: &cli.connection,
        output: cli.output,
        query: cli.query.as_deref(),
    };

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if cli.output.is_structured() {
                let output_data = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                });
                output::print_output(&output_data, cli.output, None).map_err(CbctlError::from)
            } else {
                println!("cbctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Connstr { connection_string } => {
            commands::connstr::handle_connstr_command(
                connection_string,
                cli.output,
                cli.query.as_deref(),
            )
        }
        Commands::Profile(profile_cmd) => {
            commands::profile::handle_profile_command(
                profile_cmd,
                conn_mgr,
                &cli.connection,
                cli.output.or(OutputFormat::Table),
            )
            .await
        }
        Commands::Api {
            method,
            path,
            data,
            form,
        } => {
            commands::api::handle_api_command(&ctx, method, path, data.as_deref(), form).await
        }
        Commands::Bucket(bucket_cmd) => {
            commands::bucket::handle_bucket_command(&ctx, bucket_cmd).await
        }
        Commands::User(user_cmd) => commands::user::handle_user_command(&ctx, user_cmd).await,
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Describe a command for logging with secrets left out
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Connstr { .. } => "connstr".to_string(),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set(args) => format!("profile set {} [credentials redacted]", args.name),
                Remove { name, .. } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Api {
            method, path, data, ..
        } => format!(
            "api {} {} {}",
            method,
            path,
            if data.is_some() { "with data" } else { "no data" }
        ),
        Commands::Bucket(cmd) => {
            use cli::BucketCommands::*;
            match cmd {
                List => "bucket list".to_string(),
                Info { name } => format!("bucket info {}", name),
                Create { name, .. } => format!("bucket create {} [password redacted]", name),
                Update { name, .. } => format!("bucket update {} [password redacted]", name),
                Remove { name, .. } => format!("bucket remove {}", name),
                Wait { name, timeout, .. } => format!("bucket wait {} ({}s)", name, timeout),
            }
        }
        Commands::User(cmd) => {
            use cli::UserCommands::*;
            match cmd {
                List { domain } => format!("user list --domain {}", domain),
                Get { id, domain } => format!("user get {} --domain {}", id, domain),
                Upsert { id, domain, .. } => {
                    format!("user upsert {} --domain {} [password redacted]", id, domain)
                }
                Remove { id, domain, .. } => format!("user remove {} --domain {}", id, domain),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command_redacts_passwords() {
        let cli = Cli::try_parse_from([
            "cbctl",
            "bucket",
            "create",
            "dummy",
            "--bucket-password",
            "letmein",
        ])
        .unwrap();
        let described = format_command(&cli.command);
        assert_eq!(described, "bucket create dummy [password redacted]");
        assert!(!described.contains("letmein"));
    }
}
