//! CLI argument definitions
//!
//! All Clap derive structs for `cyberdrill` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::api::DEFAULT_BIND_ADDR;
use crate::config::{ConfigOverrides, SessionConfig};
use crate::error::ConfigError;
use crate::observability::LogFormat;
use crate::scenario::Mode;
use crate::session::StealthLevel;

// ============================================================================
// Root CLI
// ============================================================================

/// Educational attacker-versus-defender drill simulator.
#[derive(Parser, Debug)]
#[command(name = "cyberdrill", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CYBERDRILL_COLOR")]
    pub color: ColorChoice,

    /// Diagnostic log format on stderr.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "CYBERDRILL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a drill session behind the HTTP control API.
    Serve(ServeArgs),

    /// Run a drill session from an interactive terminal.
    Console(ConsoleArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Session options
// ============================================================================

/// Options shared by every command that builds a session.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Path to YAML session configuration.
    #[arg(short, long, env = "CYBERDRILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Initial stealth level.
    #[arg(long, env = "CYBERDRILL_STEALTH")]
    pub stealth: Option<StealthLevel>,

    /// Initial scenario.
    #[arg(long)]
    pub mode: Option<Mode>,

    /// RNG seed for a reproducible drill.
    #[arg(long, env = "CYBERDRILL_SEED")]
    pub seed: Option<u64>,

    /// Port a block rule must name to stop the attacker.
    #[arg(long)]
    pub target_port: Option<u16>,

    /// Disable the autonomous attacker loop; steps happen only on request.
    #[arg(long)]
    pub manual: bool,
}

impl SessionArgs {
    /// Flags and environment values as config overrides.
    #[must_use]
    pub const fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            stealth: self.stealth,
            mode: self.mode,
            seed: self.seed,
            target_port: self.target_port,
            manual: self.manual,
        }
    }

    /// Builds the session configuration: file (or defaults), then overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be loaded or the merged
    /// result fails validation.
    pub fn load_config(&self) -> Result<SessionConfig, ConfigError> {
        let mut config = match self.config {
            Some(ref path) => {
                tracing::info!(config = %path.display(), "loading configuration");
                SessionConfig::load(path)?
            }
            None => SessionConfig::default(),
        };
        config.apply(self.overrides());
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Command arguments
// ============================================================================

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Control API address as `[host:]port`.
    #[arg(long, default_value = DEFAULT_BIND_ADDR, env = "CYBERDRILL_BIND")]
    pub bind: String,

    /// Expose Prometheus metrics on this port.
    #[arg(long, env = "CYBERDRILL_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Session options.
    #[command(flatten)]
    pub session: SessionArgs,
}

/// Arguments for `console`.
#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Session options.
    #[command(flatten)]
    pub session: SessionArgs,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
