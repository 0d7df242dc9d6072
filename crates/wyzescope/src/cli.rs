//! Clap derive structures for the `wyzescope` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wyzescope -- snapshot and diff Wyze cloud device state
#[derive(Debug, Parser)]
#[command(
    name = "wyzescope",
    version,
    about = "Map Wyze app toggles to the cloud property keys they mutate",
    long_about = "Captures point-in-time snapshots of your Wyze account's device state\n\
        (device listing, device_params, property-list PIDs) and computes a precise\n\
        structural diff between two snapshots.\n\n\
        Typical flow: scrape -> flip ONE setting in the Wyze app -> scrape again ->\n\
        diff the two files to see which key changed.",
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
    /// Output format
    #[arg(long, short = 'o', default_value = "text", global = true)]
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "WYZE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "WYZE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Grouped plain text (default, the human-readable report)
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
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
    /// Capture a snapshot of the account's device state
    Scrape(ScrapeArgs),

    /// Diff two snapshot files
    Diff(DiffArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCRAPE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Write the snapshot to this path (default: wyzescope_<timestamp>.json)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Account email
    #[arg(long, env = "WYZE_EMAIL")]
    pub email: Option<String>,

    /// Account password (hashed before transmission; `hashed:`/`md5:`
    /// prefixes pass a pre-hashed value through)
    #[arg(long, env = "WYZE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// API key id from the developer portal
    #[arg(long, env = "WYZE_KEY_ID")]
    pub key_id: Option<String>,

    /// API key from the developer portal
    #[arg(long, env = "WYZE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Skip per-device get_device_Info calls (fewer API calls, no PIDs)
    #[arg(long)]
    pub no_device_info: bool,

    /// Fetch a small recent event sample per device (more API calls)
    #[arg(long)]
    pub include_events: bool,

    /// Max concurrent per-device detail calls
    #[arg(long, default_value = "2")]
    pub max_concurrent: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DIFF
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Path to the BEFORE snapshot
    pub before: PathBuf,

    /// Path to the AFTER snapshot
    pub after: PathBuf,

    /// Limit output to a single device MAC (case-insensitive)
    #[arg(long)]
    pub mac: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
