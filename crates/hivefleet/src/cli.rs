//! Clap derive structures for the `hivefleet` CLI.
//!
//! Defines the command tree, global flags, and shared types. Only depends
//! on clap + clap_complete so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hivefleet -- watch and control HiveOS mining rigs
#[derive(Debug, Parser)]
#[command(
    name = "hivefleet",
    version,
    about = "Watch and control HiveOS mining rigs from the command line",
    long_about = "Polls the HiveOS farm API, shows worker state, and sends miner,\n\
        shutdown, upgrade and reboot commands to individual rigs.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "HIVEFLEET_PROFILE", global = true)]
    pub profile: Option<String>,

    /// HiveOS API base URL (overrides profile)
    #[arg(long, env = "HIVEFLEET_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Personal access token (overrides profile and keyring)
    #[arg(long, env = "HIVEFLEET_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HIVEFLEET_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates (self-hosted API)
    #[arg(long, short = 'k', env = "HIVEFLEET_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "HIVEFLEET_TIMEOUT", global = true)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List farms visible to the access token
    #[command(alias = "f")]
    Farms(FarmsArgs),

    /// Inspect and control workers (rigs)
    #[command(alias = "w")]
    Workers(WorkersArgs),

    /// Poll every worker and stream state changes until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FARMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FarmsArgs {
    #[command(subcommand)]
    pub command: FarmsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FarmsCommand {
    /// List farms
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WORKERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WorkersArgs {
    #[command(subcommand)]
    pub command: WorkersCommand,
}

/// A worker addressed by farm and worker id.
#[derive(Debug, Clone, Copy, Args)]
pub struct WorkerRef {
    /// Farm ID
    pub farm: u64,

    /// Worker ID
    pub worker: u64,
}

#[derive(Debug, Subcommand)]
pub enum WorkersCommand {
    /// List workers of one farm, or of every farm
    #[command(alias = "ls")]
    List {
        /// Only list workers of this farm
        #[arg(long)]
        farm: Option<u64>,
    },

    /// Show one worker's current state
    Show(WorkerRef),

    /// Start mining (no-op if already mining)
    On(WorkerRef),

    /// Stop mining (no-op if already stopped)
    Off(WorkerRef),

    /// Restart the miner process
    Restart(WorkerRef),

    /// Reboot the rig
    Reboot(WorkerRef),

    /// Power the rig off
    Shutdown(WorkerRef),

    /// Upgrade Hive OS (only when an upgrade is pending)
    Upgrade(WorkerRef),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Abort if any worker fails its first poll (default: skip it)
    #[arg(long)]
    pub fail_fast: bool,

    /// Only watch workers of this farm
    #[arg(long)]
    pub farm: Option<u64>,

    /// Seconds between polls (overrides profile)
    #[arg(long)]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup (validates the token)
    Init,

    /// Check that the active profile's token is accepted by the API
    Validate,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an access token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
