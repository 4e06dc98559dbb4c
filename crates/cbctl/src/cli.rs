//! CLI structure and command definitions

use cbctl_core::{AuthDomain, BucketType};
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Cluster administration from the command line
#[derive(Parser, Debug)]
#[command(name = "cbctl")]
#[command(version, about = "Administration CLI for Couchbase-style clusters")]
#[command(long_about = "
Administration CLI for Couchbase-style clusters

Talks to the cluster management REST API to manage buckets and RBAC users.
Connection details come from flags, CBCTL_* environment variables, or a
named profile in the configuration file.

EXAMPLES:
    # Save a profile for a local cluster
    cbctl profile set local --host 127.0.0.1 --username Administrator

    # List buckets
    cbctl bucket list

    # Create a bucket and wait for it to come online
    cbctl bucket create travel --ram-quota 256 --wait

    # Filter output with JMESPath
    cbctl bucket list -o json -q '[].name'

    # Direct API access
    cbctl api get /pools/default

For more help on a specific command, run:
    cbctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "CBCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "CBCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Cluster connection overrides, taking precedence over the profile
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Connection string, e.g. couchbase://host1,host2/bucket
    #[arg(long, global = true, conflicts_with_all = ["host", "port"])]
    pub connection_string: Option<String>,

    /// Management host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Management port (default 8091, or 18091 with --tls)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Administrator username
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Administrator password (prompted for when missing)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Use HTTPS for the management API
    #[arg(long, global = true)]
    pub tls: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub request_timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Whether any flag names a cluster
    pub fn names_cluster(&self) -> bool {
        self.connection_string.is_some() || self.host.is_some() || self.port.is_some()
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raw API access - direct REST endpoint calls
    #[command(after_help = "EXAMPLES:
    # Cluster overview
    cbctl api get /pools/default

    # Form-encoded POST, as the management API expects
    cbctl api post /settings/indexes --form storageMode=plasma

    # JSON body from a file
    cbctl api post /some/endpoint --data @body.json
")]
    Api {
        /// HTTP method (get, post, put, delete)
        method: String,

        /// API path, e.g. /pools/default
        path: String,

        /// JSON request body: inline, @file, or - for stdin
        #[arg(long, conflicts_with = "form")]
        data: Option<String>,

        /// Form field as key=value (repeatable)
        #[arg(long, value_name = "KEY=VALUE")]
        form: Vec<String>,
    },

    /// Bucket management
    #[command(subcommand)]
    Bucket(BucketCommands),

    /// RBAC user management
    #[command(subcommand)]
    User(UserCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Parse a connection string and show the resolved endpoint
    #[command(after_help = "EXAMPLES:
    cbctl connstr couchbase://10.0.0.1,10.0.0.2/travel-sample
    cbctl connstr 'couchbases://[::1]:18091?timeout=10s' -o json
")]
    Connstr {
        /// Connection string to parse
        connection_string: String,
    },

    /// Show version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    # Generate completions for bash
    cbctl completions bash > ~/.local/share/bash-completion/completions/cbctl

    # Generate completions for zsh
    cbctl completions zsh > ~/.zfunc/_cbctl
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Bucket commands
#[derive(Subcommand, Debug)]
pub enum BucketCommands {
    /// List all buckets
    #[command(visible_alias = "ls")]
    List,

    /// Show one bucket's configuration and node health
    #[command(visible_alias = "get")]
    Info {
        /// Bucket name
        name: String,
    },

    /// Create a bucket
    #[command(after_help = "EXAMPLES:
    cbctl bucket create travel --ram-quota 256
    cbctl bucket create sessions --type ephemeral --ram-quota 100 --replicas 0
    cbctl bucket create dummy --bucket-password letmein --wait --timeout 15
")]
    Create {
        /// Bucket name
        name: String,

        /// Bucket type
        #[arg(long = "type", value_enum, default_value = "couchbase")]
        bucket_type: BucketType,

        /// RAM quota per node in MB
        #[arg(long, default_value_t = 100)]
        ram_quota: u64,

        /// Bucket password
        #[arg(long = "bucket-password", id = "bucket_password")]
        password: Option<String>,

        /// Number of replicas (ignored for memcached buckets)
        #[arg(long)]
        replicas: Option<u32>,

        /// Allow the bucket to be flushed
        #[arg(long)]
        flush: bool,

        /// Wait until every node reports the bucket healthy
        #[arg(long)]
        wait: bool,

        /// Seconds to wait with --wait
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Change a bucket's settings, keeping the rest of its configuration
    #[command(after_help = "EXAMPLES:
    cbctl bucket update travel --ram-quota 512
    cbctl bucket update dummy --bucket-password ''
")]
    Update {
        /// Bucket name
        name: String,

        /// New bucket password (empty string clears it)
        #[arg(long = "bucket-password", id = "bucket_password")]
        password: Option<String>,

        /// New replica count
        #[arg(long)]
        replicas: Option<u32>,

        /// New RAM quota per node in MB
        #[arg(long)]
        ram_quota: Option<u64>,

        /// Enable or disable flush
        #[arg(long)]
        flush: Option<bool>,
    },

    /// Delete a bucket
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// Bucket name
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Wait until a bucket is ready on every node
    Wait {
        /// Bucket name
        name: String,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Milliseconds between polls
        #[arg(long, default_value_t = 200)]
        interval: u64,
    },
}

/// User commands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users in a domain
    #[command(visible_alias = "ls")]
    List {
        /// Authentication domain
        #[arg(long, value_enum, default_value = "local")]
        domain: AuthDomain,
    },

    /// Show one user
    #[command(visible_alias = "show")]
    Get {
        /// User id
        id: String,

        /// Authentication domain
        #[arg(long, value_enum, default_value = "local")]
        domain: AuthDomain,
    },

    /// Create or replace a user
    #[command(after_help = "EXAMPLES:
    cbctl user upsert app --user-password s3cr3t --role 'data_reader[default]' --role 'data_writer[default]'
    cbctl user upsert 'cn=alice' --domain external --role admin
")]
    Upsert {
        /// User id
        id: String,

        /// Authentication domain
        #[arg(long, value_enum, default_value = "local")]
        domain: AuthDomain,

        /// Password (local users only)
        #[arg(long = "user-password", id = "user_password")]
        password: Option<String>,

        /// Role as role or role[bucket] (repeatable)
        #[arg(long = "role", required = true)]
        roles: Vec<String>,
    },

    /// Delete a user
    #[command(visible_alias = "rm", visible_alias = "delete")]
    Remove {
        /// User id
        id: String,

        /// Authentication domain
        #[arg(long, value_enum, default_value = "local")]
        domain: AuthDomain,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Create or update a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    cbctl profile set local --host 127.0.0.1 --username Administrator --password password
    cbctl profile set prod --connection-string couchbases://db1.example.com --use-keyring --default
")]
    Set(ProfileSetArgs),

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to make default
        name: String,
    },
}

/// Arguments for `profile set`. The cluster itself comes from the global
/// connection flags.
#[derive(Args, Debug)]
pub struct ProfileSetArgs {
    /// Profile name
    pub name: String,

    /// Default bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Store the password in the OS keyring
    #[cfg(feature = "secure-storage")]
    #[arg(long)]
    pub use_keyring: bool,

    /// Make this the default profile
    #[arg(long)]
    pub default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_connection_flags_are_global() {
        let cli = Cli::try_parse_from([
            "cbctl",
            "bucket",
            "list",
            "--host",
            "10.0.0.5",
            "-u",
            "ops",
        ])
        .unwrap();
        assert_eq!(cli.connection.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(cli.connection.username.as_deref(), Some("ops"));
        assert!(cli.connection.names_cluster());
    }

    #[test]
    fn test_connection_string_conflicts_with_host() {
        let result = Cli::try_parse_from([
            "cbctl",
            "--connection-string",
            "couchbase://a",
            "--host",
            "b",
            "bucket",
            "list",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_upsert_requires_a_role() {
        assert!(Cli::try_parse_from(["cbctl", "user", "upsert", "app"]).is_err());
    }

    #[test]
    fn test_bucket_create_defaults() {
        let cli = Cli::try_parse_from(["cbctl", "bucket", "create", "dummy"]).unwrap();
        match cli.command {
            Commands::Bucket(BucketCommands::Create {
                bucket_type,
                ram_quota,
                wait,
                ..
            }) => {
                assert_eq!(bucket_type, BucketType::Couchbase);
                assert_eq!(ram_quota, 100);
                assert!(!wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
