//! Error types for `cyberdrill`
//!
//! The drill engine itself never surfaces errors to callers: invalid operator
//! input is rendered as an ordinary message. The types here cover parsing of
//! enumerated inputs, configuration loading, and the serving layer.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `cyberdrill` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (terminal, output, or metrics listener failure)
    pub const IO_ERROR: i32 = 3;

    /// Control server error (bind failed, serve loop failed)
    pub const SERVER_ERROR: i32 = 4;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `cyberdrill` operations.
#[derive(Debug, Error)]
pub enum CyberDrillError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Control server error
    #[error(transparent)]
    Server(#[from] ServerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CyberDrillError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Server(_) => ExitCode::SERVER_ERROR,
            Self::Io(_) | Self::Json(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Server Errors
// ============================================================================

/// Errors raised by the HTTP control surface.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listener
    #[error("bind failed: {0}")]
    Bind(String),

    /// The serve loop terminated with an error
    #[error("serve failed: {0}")]
    Serve(String),
}

// ============================================================================
// Input Errors
// ============================================================================

/// Rejected enumerated input.
///
/// The display text is the operator-facing rejection message, so the session
/// can hand it back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Not one of the five scenario modes
    #[error("Invalid mode. Valid: bruteforce, sqli, xss, phishing, portscan.")]
    InvalidMode(String),

    /// Not one of the three stealth levels
    #[error("Invalid stealth level. Use 'low', 'medium', or 'high'.")]
    InvalidStealth(String),
}

impl InputError {
    /// Returns the rejected input as supplied.
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidMode(s) | Self::InvalidStealth(s) => s,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
