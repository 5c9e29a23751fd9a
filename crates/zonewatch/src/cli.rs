//! Clap derive structures for the `zonewatch` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zonewatch -- firewall and DDoS activity for your zones
#[derive(Debug, Parser)]
#[command(
    name = "zonewatch",
    version,
    about = "Watch firewall blocks and DDoS attacks across your zones",
    long_about = "Aggregates firewall events and attack analytics for the zones\n\
        visible to an API token: top blocked paths, offending IPs, the\n\
        blocked-request total, and detected DDoS windows.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API token for this invocation only (takes precedence over every
    /// configured source)
    #[arg(long, env = "ZONEWATCH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Account id for account-level attack analytics
    #[arg(long, short = 'a', env = "ZONEWATCH_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZONEWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List zones visible to the current token
    #[command(alias = "z")]
    Zones,

    /// Full security report for one zone
    #[command(alias = "r")]
    Report(ZoneArgs),

    /// Detected DDoS attack windows for one zone
    Ddos(DdosArgs),

    /// Refresh on an interval and print each published report
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Inspect or change the saved API token
    Auth(AuthArgs),

    /// Show or initialize the config file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ZoneArgs {
    /// Zone id or name
    pub zone: String,
}

#[derive(Debug, Args)]
pub struct DdosArgs {
    /// Zone id or name
    pub zone: String,

    /// Lookback window in days (defaults to the configured DDoS lookback)
    #[arg(long, short = 'd')]
    pub days: Option<u32>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Zone id or name; without one only the zone list is refreshed
    pub zone: Option<String>,
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Show where the active token comes from
    Status,

    /// Validate a token and save it to the OS keyring
    Set {
        /// The API token
        token: String,

        /// Account id to save alongside the token
        #[arg(long = "account-id")]
        account_id: Option<String>,
    },

    /// Remove the saved token from the OS keyring
    Clear,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the effective config (file plus environment overrides)
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
