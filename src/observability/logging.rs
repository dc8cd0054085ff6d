//! Logging initialization for `cyberdrill`.
//!
//! All diagnostics go to stderr through `tracing`; stdout belongs to the
//! console drill. Level comes from `-v` flags unless `CYBERDRILL_LOG_LEVEL`
//! holds a filter directive.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "CYBERDRILL_LOG_LEVEL";

/// Log output format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One line per event, colored when the terminal allows.
    #[default]
    Human,
    /// Newline-delimited JSON with event fields flattened to the top level,
    /// for shipping drill transcripts to a collector.
    Json,
}

/// Maps a `-v` count to a filter directive. Quiet by default so the console
/// transcript stays readable.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Decides whether human output gets ANSI colors.
///
/// `Auto` colors only a terminal and honors `NO_COLOR`.
#[must_use]
pub const fn use_ansi(color: ColorChoice, stderr_is_terminal: bool, no_color: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_terminal && !no_color,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)))
}

/// Installs the global subscriber.
///
/// Module targets are shown from `-vv` up. A second call is a no-op.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = build_filter(verbosity);
    let show_target = verbosity >= 2;

    let installed = match format {
        LogFormat::Human => {
            let ansi = use_ansi(
                color,
                std::io::stderr().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
            );
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(ansi)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init()
        }
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(?format, verbosity, "logging initialized");
    }
}
