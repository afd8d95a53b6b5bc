use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::render::OutputFormat;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "mailcow-cli",
    version,
    about = "Manage mailcow sync jobs, mailboxes, aliases and transport maps via the API"
)]
pub struct CliArgs {
    /// Load `.env.<NAME>` instead of `.env`
    #[arg(short = 's', long, global = true, value_name = "NAME")]
    pub select_env: Option<String>,

    /// Config file (default: ~/.config/mailcow-cli/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Profile from the config file
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// mailcow server URL
    #[arg(long, env = "MAILCOW_API_URL", global = true, hide_env_values = true)]
    pub api_url: Option<String>,

    /// mailcow API key
    #[arg(long, env = "MAILCOW_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage sync jobs (imapsync)
    #[command(subcommand)]
    Jobs(JobsCommand),
    /// Manage mailboxes
    #[command(subcommand)]
    Mailbox(MailboxCommand),
    /// Manage aliases
    #[command(subcommand)]
    Alias(AliasCommand),
    /// Manage transport maps
    #[command(subcommand)]
    Transport(TransportCommand),
}

/// `--flag` / `--no-flag` pairs resolve to `Some(true)`, `Some(false)` or
/// `None` when neither was given.
pub fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (_, true) => Some(false),
        (true, false) => Some(true),
        (false, false) => None,
    }
}

pub fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum Encryption {
    Ssl,
    Tls,
    Plain,
}

impl Encryption {
    pub fn as_str(self) -> &'static str {
        match self {
            Encryption::Ssl => "SSL",
            Encryption::Tls => "TLS",
            Encryption::Plain => "PLAIN",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// CSV file for batch mode
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Show what would be created without calling the API
    #[arg(long, default_value_t = false)]
    pub preview: bool,

    /// Output format for previews and generated credentials
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum JobsCommand {
    /// List all sync jobs
    Get {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        /// Include logs in the response (can be slow)
        #[arg(long, default_value_t = false)]
        include_log: bool,
    },
    /// Add sync job(s); CSV columns: user1,password1,username
    Add(JobsAdd),
    /// Update an existing sync job
    Update(JobsUpdate),
}

#[derive(Args, Debug, Clone)]
pub struct JobsAdd {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Source IMAP host
    #[arg(long, env = "MAILCOW_SRC_HOST")]
    pub host1: Option<String>,
    #[arg(long, env = "MAILCOW_SRC_PORT")]
    pub port1: Option<String>,
    #[arg(long, env = "MAILCOW_SRC_ENC", value_enum, ignore_case = true)]
    pub enc1: Option<Encryption>,

    /// Source mailbox username (required without -f)
    #[arg(long)]
    pub user1: Option<String>,
    /// Source mailbox password (required without -f)
    #[arg(long)]
    pub password1: Option<String>,
    /// Destination mailbox (required without -f)
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub mins_interval: Option<String>,
    /// Regex of folders to exclude
    #[arg(long)]
    pub exclude: Option<String>,

    #[arg(long, overrides_with = "no_delete2duplicates")]
    pub delete2duplicates: bool,
    #[arg(long)]
    pub no_delete2duplicates: bool,
    #[arg(long, overrides_with = "no_automap")]
    pub automap: bool,
    #[arg(long)]
    pub no_automap: bool,
    #[arg(long, overrides_with = "no_subscribeall")]
    pub subscribeall: bool,
    #[arg(long)]
    pub no_subscribeall: bool,
    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,

    /// Pass --dry to imapsync
    #[arg(long, default_value_t = false)]
    pub dry: bool,
    /// Additional imapsync parameters
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub custom_params: String,
}

#[derive(Args, Debug, Clone)]
pub struct JobsUpdate {
    pub job_id: String,

    #[arg(long)]
    pub host1: Option<String>,
    #[arg(long)]
    pub port1: Option<String>,
    #[arg(long, value_enum, ignore_case = true)]
    pub enc1: Option<Encryption>,
    #[arg(long)]
    pub user1: Option<String>,
    #[arg(long)]
    pub password1: Option<String>,
    #[arg(long)]
    pub mins_interval: Option<String>,
    #[arg(long)]
    pub exclude: Option<String>,

    #[arg(long, overrides_with = "no_delete2duplicates")]
    pub delete2duplicates: bool,
    #[arg(long)]
    pub no_delete2duplicates: bool,
    #[arg(long, overrides_with = "no_automap")]
    pub automap: bool,
    #[arg(long)]
    pub no_automap: bool,
    #[arg(long, overrides_with = "no_subscribeall")]
    pub subscribeall: bool,
    #[arg(long)]
    pub no_subscribeall: bool,
    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,

    /// Add --dry to custom_params
    #[arg(long, default_value_t = false)]
    pub dry: bool,
    /// Remove --dry from custom_params
    #[arg(long, default_value_t = false)]
    pub no_dry: bool,
    #[arg(long, allow_hyphen_values = true)]
    pub custom_params: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MailboxCommand {
    /// List all mailboxes
    Get {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        /// Filter by domain
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Add mailbox(es); CSV columns: local_part[,name[,password]]
    Add(MailboxAdd),
    /// Update an existing mailbox
    Update(MailboxUpdate),
}

#[derive(Args, Debug, Clone)]
pub struct MailboxAdd {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Mailbox domain
    #[arg(short, long, env = "MAILCOW_DOMAIN")]
    pub domain: Option<String>,
    /// Local part of the address (required without -f)
    #[arg(long)]
    pub local_part: Option<String>,
    /// Full name; derived from the local part when empty
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long)]
    pub password: Option<String>,
    /// Generate a random password
    #[arg(long, default_value_t = false)]
    pub gen_password: bool,
    /// Length of generated passwords
    #[arg(long, default_value_t = crate::resource::DEFAULT_PASSWORD_LENGTH)]
    pub password_length: usize,
    /// Quota in MB (0 = domain default)
    #[arg(long, default_value = "0")]
    pub quota: String,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
    #[arg(long, overrides_with = "no_force_pw_update")]
    pub force_pw_update: bool,
    #[arg(long)]
    pub no_force_pw_update: bool,
    #[arg(long, overrides_with = "no_tls_enforce_in")]
    pub tls_enforce_in: bool,
    #[arg(long)]
    pub no_tls_enforce_in: bool,
    #[arg(long, overrides_with = "no_tls_enforce_out")]
    pub tls_enforce_out: bool,
    #[arg(long)]
    pub no_tls_enforce_out: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MailboxUpdate {
    /// Full address, e.g. john@example.com
    pub username: String,

    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub quota: Option<String>,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
    #[arg(long, overrides_with = "no_force_pw_update")]
    pub force_pw_update: bool,
    #[arg(long)]
    pub no_force_pw_update: bool,
    #[arg(long, overrides_with = "no_tls_enforce_in")]
    pub tls_enforce_in: bool,
    #[arg(long)]
    pub no_tls_enforce_in: bool,
    #[arg(long, overrides_with = "no_tls_enforce_out")]
    pub tls_enforce_out: bool,
    #[arg(long)]
    pub no_tls_enforce_out: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AliasCommand {
    /// List all aliases
    Get {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Add alias(es); CSV columns: address,goto
    Add(AliasAdd),
    /// Update an existing alias
    Update(AliasUpdate),
}

#[derive(Args, Debug, Clone)]
pub struct AliasAdd {
    #[command(flatten)]
    pub batch: BatchArgs,

    #[arg(long)]
    pub address: Option<String>,
    /// Comma-separated destination addresses
    #[arg(long)]
    pub goto: Option<String>,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
    #[arg(long, overrides_with = "no_sogo_visible")]
    pub sogo_visible: bool,
    #[arg(long)]
    pub no_sogo_visible: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AliasUpdate {
    pub alias_id: String,

    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub goto: Option<String>,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
    #[arg(long, overrides_with = "no_sogo_visible")]
    pub sogo_visible: bool,
    #[arg(long)]
    pub no_sogo_visible: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransportCommand {
    /// List all transport maps
    Get {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Add transport map(s); CSV columns: destination,nexthop[,username,password]
    Add(TransportAdd),
    /// Update an existing transport map
    Update(TransportUpdate),
    /// Delete transport map(s)
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TransportAdd {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Destination domain or pattern, e.g. example.com
    #[arg(long)]
    pub destination: Option<String>,
    /// Next hop, e.g. [smtp.relay.com]:587
    #[arg(long)]
    pub nexthop: Option<String>,
    #[arg(long, default_value = "")]
    pub username: String,
    #[arg(long, default_value = "")]
    pub password: String,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TransportUpdate {
    pub transport_id: String,

    #[arg(long)]
    pub destination: Option<String>,
    #[arg(long)]
    pub nexthop: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long, overrides_with = "no_active")]
    pub active: bool,
    #[arg(long)]
    pub no_active: bool,
}

/// Finds `-s NAME` / `--select-env NAME` before clap runs, so the env
/// file is loaded before env-backed flags are read.
pub fn select_env_from_args<I>(args: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        if arg == "-s" || arg == "--select-env" {
            return iter.next().map(|v| v.as_ref().to_string());
        }
        if let Some(v) = arg.strip_prefix("--select-env=") {
            return Some(v.to_string());
        }
        if arg == "--" {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn toggles() {
        assert_eq!(toggle(false, false), None);
        assert_eq!(toggle(true, false), Some(true));
        assert_eq!(toggle(false, true), Some(false));
    }

    #[test]
    fn select_env_is_found_before_parsing() {
        assert_eq!(
            select_env_from_args(["mailcow-cli", "-s", "domeniu1", "jobs", "get"]),
            Some("domeniu1".to_string())
        );
        assert_eq!(
            select_env_from_args(["mailcow-cli", "--select-env=prod", "alias", "get"]),
            Some("prod".to_string())
        );
        assert_eq!(select_env_from_args(["mailcow-cli", "alias", "get"]), None);
    }

    #[test]
    fn mailbox_add_parses_toggles() {
        let args = CliArgs::try_parse_from([
            "mailcow-cli",
            "--api-url",
            "https://mail.example.com",
            "--api-key",
            "k",
            "mailbox",
            "add",
            "-d",
            "example.com",
            "--local-part",
            "john",
            "--gen-password",
            "--no-active",
            "--preview",
        ])
        .unwrap();
        let Command::Mailbox(MailboxCommand::Add(add)) = args.command else {
            panic!("expected mailbox add");
        };
        assert!(add.gen_password);
        assert!(add.batch.preview);
        assert_eq!(toggle(add.active, add.no_active), Some(false));
        assert_eq!(add.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn enc1_is_case_insensitive() {
        let args = CliArgs::try_parse_from([
            "mailcow-cli", "jobs", "update", "5", "--enc1", "tls",
        ])
        .unwrap();
        let Command::Jobs(JobsCommand::Update(update)) = args.command else {
            panic!("expected jobs update");
        };
        assert_eq!(update.enc1, Some(Encryption::Tls));
    }
}
