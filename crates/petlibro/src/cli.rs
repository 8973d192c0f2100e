//! Clap derive structures for the `petlibro` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::num::NonZeroU32;

use clap::{Args, Parser, Subcommand, ValueEnum};
use petlibro_core::DeviceKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// petlibro -- control PETLIBRO feeders and fountains from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "petlibro",
    version,
    about = "Control PETLIBRO smart feeders and water fountains from the command line",
    long_about = "Talks to the PETLIBRO cloud with your app account.\n\n\
        Lists devices, reads live status and daily counters, triggers manual\n\
        feeds and toggles lights and sounds. `watch` keeps polling and prints\n\
        availability and low-stock events as they happen.",
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
    #[arg(long, short = 'p', env = "PETLIBRO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account email (overrides profile)
    #[arg(long, short = 'e', env = "PETLIBRO_EMAIL", global = true)]
    pub email: Option<String>,

    /// Cloud API base URL (overrides profile)
    #[arg(long, env = "PETLIBRO_BASE_URL", global = true, hide_env = true)]
    pub base_url: Option<String>,

    /// Account region, e.g. US or DE (overrides profile)
    #[arg(long, env = "PETLIBRO_REGION", global = true)]
    pub region: Option<String>,

    /// IANA timezone sent with requests (overrides profile)
    #[arg(long, env = "PETLIBRO_TIMEZONE", global = true)]
    pub timezone: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PETLIBRO_OUTPUT",
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

    /// Request timeout in seconds (default 15)
    #[arg(long, env = "PETLIBRO_TIMEOUT", global = true)]
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
    /// Log in and store the session token
    Login,

    /// Forget the stored session token
    Logout,

    /// List devices bound to the account
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show the live state of one device
    Status {
        /// Device serial number
        serial: String,
    },

    /// Show today's feeding or drinking counters
    Stats {
        /// Device serial number
        serial: String,
    },

    /// Dispense food now
    Feed {
        /// Feeder serial number
        serial: String,

        /// Number of portions
        #[arg(long, short = 'n', default_value = "1")]
        portions: NonZeroU32,
    },

    /// Turn the indicator light on or off
    Light {
        /// Device serial number
        serial: String,

        state: Switch,
    },

    /// Turn the device sounds on or off
    Sound {
        /// Device serial number
        serial: String,

        state: Switch,
    },

    /// Poll devices and print events until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only list one kind of device
    #[arg(long, short = 'k', value_parser = parse_kind)]
    pub kind: Option<DeviceKind>,
}

fn parse_kind(value: &str) -> Result<DeviceKind, String> {
    value
        .parse::<DeviceKind>()
        .ok()
        .filter(|kind| kind.is_supported())
        .ok_or_else(|| format!("expected 'feeder' or 'fountain', got '{value}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Serials to watch (default: every supported device)
    pub serials: Vec<String>,

    /// Seconds between polls (overrides profile)
    #[arg(long, short = 'i')]
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
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Store the account password in the system keyring
    SetPassword {
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
