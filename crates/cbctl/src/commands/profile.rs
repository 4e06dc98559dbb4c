//! Profile management command implementations

use std::io::IsTerminal;

use anyhow::Context;
use cbctl_core::config::{Config, Profile};
use comfy_table::Table;
use serde_json::json;
use tracing::{debug, info};

use super::utils::confirm_action;
use crate::cli::{ConnectionArgs, ProfileCommands, ProfileSetArgs};
use crate::connection::ConnectionManager;
use crate::error::{CbctlError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    connection: &ConnectionArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    match profile_cmd {
        ProfileCommands::List => handle_list(conn_mgr, output_format),
        ProfileCommands::Path => handle_path(conn_mgr, output_format),
        ProfileCommands::Show { name } => handle_show(conn_mgr, name, output_format),
        ProfileCommands::Set(args) => handle_set(conn_mgr, args, connection),
        ProfileCommands::Remove { name, force } => handle_remove(conn_mgr, name, *force),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let config = &conn_mgr.config;
    let profiles = config.list_profiles();

    if output_format.is_structured() {
        let entries: Vec<_> = profiles
            .into_iter()
            .map(|(name, profile)| {
                json!({
                    "name": name,
                    "target": profile.target(),
                    "username": profile.username,
                    "tls": profile.tls,
                    "default": config.default_profile.as_deref() == Some(name.as_str()),
                })
            })
            .collect();
        let count = entries.len();
        print_output(
            json!({"profiles": entries, "count": count}),
            output_format,
            None,
        )?;
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles configured.");
        println!("Use 'cbctl profile set' to create a profile.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["NAME", "TARGET", "USERNAME", "DEFAULT"]);
    for (name, profile) in profiles {
        let is_default = config.default_profile.as_deref() == Some(name.as_str());
        table.add_row(vec![
            name.clone(),
            profile.target(),
            profile.username.clone(),
            if is_default { "*" } else { "" }.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if output_format.is_structured() {
        print_output(
            json!({"config_path": config_path.to_str()}),
            output_format,
            None,
        )?;
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| CbctlError::ProfileNotFound {
            name: name.to_string(),
        })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    let password = match &profile.password {
        Some(p) if p.starts_with("keyring:") => "(keyring)",
        Some(_) => "(set)",
        None => "(not set)",
    };

    if output_format.is_structured() {
        print_output(
            json!({
                "name": name,
                "connection_string": profile.connection_string,
                "host": profile.host,
                "port": profile.port,
                "bucket": profile.bucket,
                "username": profile.username,
                "password": password,
                "tls": profile.tls,
                "timeout_secs": profile.timeout_secs,
                "default": is_default,
            }),
            output_format,
            None,
        )?;
        return Ok(());
    }

    println!("Profile: {}{}", name, if is_default { " (default)" } else { "" });
    println!("Target: {}", profile.target());
    if let Some(bucket) = &profile.bucket {
        println!("Bucket: {}", bucket);
    }
    println!("Username: {}", profile.username);
    println!("Password: {}", password);
    println!("TLS: {}", profile.tls);
    if let Some(timeout) = profile.timeout_secs {
        println!("Timeout: {}s", timeout);
    }
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    args: &ProfileSetArgs,
    connection: &ConnectionArgs,
) -> CliResult<()> {
    debug!("Setting profile: {}", args.name);

    let password = match &connection.password {
        Some(p) => Some(p.clone()),
        None if std::io::stdin().is_terminal() => {
            let pass = rpassword::prompt_password("Password (leave empty to prompt on use): ")
                .context("Failed to read password")?;
            Some(pass).filter(|p| !p.is_empty())
        }
        None => None,
    };

    #[cfg(feature = "secure-storage")]
    let password = match password {
        Some(p) if args.use_keyring => {
            use cbctl_core::config::CredentialStore;
            let store = CredentialStore::with_keyring();
            let reference = store
                .store_credential(&format!("{}-password", args.name), &p)
                .context("Failed to store password in keyring")?;
            println!("Password stored in {}", store.storage_backend());
            Some(reference)
        }
        other => other,
    };

    let profile = Profile {
        connection_string: connection.connection_string.clone(),
        host: connection.host.clone(),
        port: connection.port,
        bucket: args.bucket.clone(),
        username: connection
            .username
            .clone()
            .unwrap_or_else(|| Profile::default().username),
        password,
        tls: connection.tls,
        timeout_secs: connection.request_timeout,
    };
    profile.validate(&args.name)?;

    let mut config = conn_mgr.config.clone();
    let is_first = config.profiles.is_empty();
    config.set_profile(args.name.clone(), profile);
    if args.default || is_first {
        config.default_profile = Some(args.name.clone());
    }
    conn_mgr.save_config(&config)?;

    info!("Saved profile '{}'", args.name);
    println!("Profile '{}' saved successfully.", args.name);
    if config.default_profile.as_deref() == Some(args.name.as_str()) {
        println!("'{}' is the default profile.", args.name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, force: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(CbctlError::ProfileNotFound { name: name.into() });
    }

    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if is_default {
        println!("Warning: '{}' is the default profile.", name);
    }

    if !force && !confirm_action(&format!("Remove profile '{}'?", name))? {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    let mut config = conn_mgr.config.clone();
    config.remove_profile(name);
    if is_default {
        println!("Default profile cleared.");
    }
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Setting default profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(CbctlError::ProfileNotFound { name: name.into() });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}
