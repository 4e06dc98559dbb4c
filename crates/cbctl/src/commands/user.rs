//! RBAC user commands

use cbctl_core::{AuthDomain, RoleAssignment, UserRecord};
use comfy_table::Table;
use serde_json::json;

use super::CommandContext;
use super::utils::confirm_action;
use crate::cli::UserCommands;
use crate::error::{CbctlError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub async fn handle_user_command(
    ctx: &CommandContext<'_>,
    command: &UserCommands,
) -> CliResult<()> {
    match command {
        UserCommands::List { domain } => handle_list(ctx, *domain).await,
        UserCommands::Get { id, domain } => handle_get(ctx, *domain, id).await,
        UserCommands::Upsert {
            id,
            domain,
            password,
            roles,
        } => {
            let roles = parse_roles(roles)?;
            handle_upsert(ctx, *domain, id, password.as_deref(), &roles).await
        }
        UserCommands::Remove { id, domain, force } => {
            handle_remove(ctx, *domain, id, *force).await
        }
    }
}

fn parse_roles(roles: &[String]) -> CliResult<Vec<RoleAssignment>> {
    roles
        .iter()
        .map(|role| role.parse::<RoleAssignment>().map_err(CbctlError::from))
        .collect()
}

async fn handle_list(ctx: &CommandContext<'_>, domain: AuthDomain) -> CliResult<()> {
    let client = ctx.client().await?;
    let users = client.users_get(domain).await?;

    match ctx.output.or(OutputFormat::Table) {
        OutputFormat::Table if ctx.query.is_none() => println!("{}", user_table(&users)),
        format => print_output(&users, format, ctx.query)?,
    }
    client.close();
    Ok(())
}

async fn handle_get(ctx: &CommandContext<'_>, domain: AuthDomain, id: &str) -> CliResult<()> {
    let client = ctx.client().await?;
    let user = client.user_get(domain, id).await?;

    match ctx.output.or(OutputFormat::Table) {
        OutputFormat::Table if ctx.query.is_none() => {
            println!("{}", user_table(std::slice::from_ref(&user)))
        }
        format => print_output(&user, format, ctx.query)?,
    }
    client.close();
    Ok(())
}

async fn handle_upsert(
    ctx: &CommandContext<'_>,
    domain: AuthDomain,
    id: &str,
    password: Option<&str>,
    roles: &[RoleAssignment],
) -> CliResult<()> {
    let client = ctx.client().await?;
    client.user_upsert(domain, id, password, roles).await?;

    if ctx.output.is_structured() || ctx.query.is_some() {
        let specs: Vec<String> = roles.iter().map(RoleAssignment::to_spec).collect();
        print_output(
            json!({"id": id, "domain": domain.as_str(), "roles": specs, "status": "upserted"}),
            ctx.output.or(OutputFormat::Json),
            ctx.query,
        )?;
    } else {
        println!("User '{}' saved in {} domain.", id, domain);
    }
    client.close();
    Ok(())
}

async fn handle_remove(
    ctx: &CommandContext<'_>,
    domain: AuthDomain,
    id: &str,
    force: bool,
) -> CliResult<()> {
    if !force && !confirm_action(&format!("Remove user '{}' from {} domain?", id, domain))? {
        println!("User removal cancelled.");
        return Ok(());
    }

    let client = ctx.client().await?;
    client.user_remove(domain, id).await?;

    if ctx.output.is_structured() || ctx.query.is_some() {
        print_output(
            json!({"id": id, "domain": domain.as_str(), "status": "removed"}),
            ctx.output.or(OutputFormat::Json),
            ctx.query,
        )?;
    } else {
        println!("User '{}' removed.", id);
    }
    client.close();
    Ok(())
}

fn user_table(users: &[UserRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "DOMAIN", "NAME", "ROLES"]);
    for user in users {
        table.add_row(vec![
            user.id.clone(),
            user.domain.to_string(),
            user.name.clone().unwrap_or_default(),
            user.roles_display(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(&["data_reader[default]".to_string(), "admin".to_string()]).unwrap();
        assert_eq!(
            roles,
            vec![
                RoleAssignment::new("data_reader", "default"),
                RoleAssignment::global("admin")
            ]
        );
    }

    #[test]
    fn test_user_table_shows_roles() {
        let user = UserRecord {
            id: "app".to_string(),
            domain: AuthDomain::Local,
            name: None,
            roles: vec![RoleAssignment::new("data_writer", "default")],
            extra: Default::default(),
        };
        let rendered = user_table(&[user]).to_string();
        assert!(rendered.contains("data_writer[default]"));
        assert!(rendered.contains("local"));
    }
}
