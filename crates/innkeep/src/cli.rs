//! Clap derive structures for the `innkeep` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// innkeep -- commission reports from hotel PMS reservations
#[derive(Debug, Parser)]
#[command(
    name = "innkeep",
    version,
    about = "Commission reports from your hotel PMS reservations",
    long_about = "Pulls checked-out reservations from the PMS API in throttled batches,\n\
        keeps the ones booked through commission-earning channels, and totals\n\
        a 5% commission over their final amounts.",
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
    /// Config file to use instead of the default location
    #[arg(long, env = "INNKEEP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "INNKEEP_OUTPUT",
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

    /// Suppress non-error output, including progress
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides pms.timeout_secs)
    #[arg(long, env = "INNKEEP_TIMEOUT", global = true)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize against the PMS and manage stored tokens
    Auth(AuthArgs),

    /// List checked-out reservations in a date window
    #[command(alias = "res")]
    Reservations(ReservationsArgs),

    /// Build a commission report
    #[command(alias = "r")]
    Report(ReportArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the URL to open in a browser to grant access
    Url,

    /// Exchange the authorization code from the redirect for tokens
    Exchange {
        /// The `code` query parameter from the redirect
        code: String,
    },

    /// Refresh the stored access token now
    Refresh,

    /// Show whether tokens are on file
    Status,
}

// ── Reservations ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReservationsArgs {
    /// First check-out date (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last check-out date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// One calendar month
    Month {
        #[arg(long)]
        year: i32,

        /// Month number (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },

    /// An arbitrary check-out window
    Range {
        /// First check-out date (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last check-out date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Report heading (defaults to the date range)
        #[arg(long)]
        title: Option<String>,
    },

    /// The previous calendar month
    LastMonth,

    /// The previous ISO week, Monday to Sunday
    LastWeek,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// OAuth client id issued by the PMS
        #[arg(long)]
        client_id: String,

        /// Redirect URI registered for the client
        #[arg(long)]
        redirect_uri: String,

        /// Restrict listings to one property
        #[arg(long)]
        property_id: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store the OAuth client secret in the system keyring
    SetSecret {
        /// Read the secret from this environment variable instead of prompting
        #[arg(long)]
        from_env: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
