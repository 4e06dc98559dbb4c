//! Command handlers

pub mod api;
pub mod bucket;
pub mod connstr;
pub mod profile;
pub mod user;
pub mod utils;

use cbctl_core::AdminClient;

use crate::cli::ConnectionArgs;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::OutputFormat;

/// Everything a handler needs from the global flags
pub struct CommandContext<'a> {
    pub conn_mgr: &'a ConnectionManager,
    pub profile: Option<&'a str>,
    pub connection: &'a ConnectionArgs,
    pub output: OutputFormat,
    pub query: Option<&'a str>,
}

impl CommandContext<'_> {
    /// Connect to the cluster selected by the flags and profile
    pub async fn client(&self) -> CliResult<AdminClient> {
        self.conn_mgr
            .create_admin_client(self.profile, self.connection)
            .await
    }
}
