//! Session configuration
//!
//! A drill session is built from an injected [`SessionConfig`]. Values come
//! from built-in defaults, an optional YAML file, and command-line or
//! environment overrides, in increasing order of precedence.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scenario::templates::DEFAULT_PHISHING_URL;
use crate::scenario::{DEFAULT_TARGET_PORT, Mode};
use crate::session::StealthLevel;
use crate::session::history::{DEFAULT_MAX_ENTRIES, DEFAULT_RETAIN_ENTRIES};

/// Maximum accepted configuration file size (64 KB).
pub const MAX_CONFIG_SIZE: u64 = 64 * 1024;

/// Default bound on waiting for the background loop to exit.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 1_000;

/// Everything needed to construct a session.
///
/// ```yaml
/// stealth: low
/// mode: phishing
/// seed: 42
/// target_port: 22
/// log_max_entries: 5000
/// log_retain_entries: 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Initial stealth level.
    pub stealth: StealthLevel,
    /// Initial scenario. Reset always returns to `bruteforce`.
    pub mode: Mode,
    /// Port a block rule must name to stop the attacker.
    pub target_port: u16,
    /// RNG seed for reproducible drills; OS entropy when absent.
    pub seed: Option<u64>,
    /// History length above which old entries are dropped.
    pub log_max_entries: usize,
    /// Entries kept after truncation.
    pub log_retain_entries: usize,
    /// Bound on waiting for the background loop during shutdown.
    pub shutdown_timeout_ms: u64,
    /// Whether the background loop runs at all.
    pub autostart: bool,
    /// Link embedded in simulated phishing emails.
    pub phishing_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stealth: StealthLevel::default(),
            mode: Mode::default(),
            target_port: DEFAULT_TARGET_PORT,
            seed: None,
            log_max_entries: DEFAULT_MAX_ENTRIES,
            log_retain_entries: DEFAULT_RETAIN_ENTRIES,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            autostart: true,
            phishing_url: DEFAULT_PHISHING_URL.to_string(),
        }
    }
}

/// Command-line and environment overrides layered over a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Overrides [`SessionConfig::stealth`].
    pub stealth: Option<StealthLevel>,
    /// Overrides [`SessionConfig::mode`].
    pub mode: Option<Mode>,
    /// Overrides [`SessionConfig::seed`].
    pub seed: Option<u64>,
    /// Overrides [`SessionConfig::target_port`].
    pub target_port: Option<u16>,
    /// Forces [`SessionConfig::autostart`] off when set.
    pub manual: bool,
}

impl SessionConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if it is too large or not valid YAML for
    /// this schema, and [`ConfigError::InvalidValue`] if validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!(
                    "file is {} bytes, limit is {MAX_CONFIG_SIZE}",
                    metadata.len()
                ),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        Self::from_yaml_str(&raw, path)
    }

    /// Parses and validates YAML text. `path` is only used in errors.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] on malformed YAML or unknown
    /// fields, and [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_yaml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let config = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(raw).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides in place.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(stealth) = overrides.stealth {
            self.stealth = stealth;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(port) = overrides.target_port {
            self.target_port = port;
        }
        if overrides.manual {
            self.autostart = false;
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_port == 0 {
            return Err(invalid("target_port", "0", "a non-zero port"));
        }
        if self.log_retain_entries == 0 {
            return Err(invalid("log_retain_entries", "0", "at least 1"));
        }
        if self.log_retain_entries > self.log_max_entries {
            return Err(invalid(
                "log_retain_entries",
                &self.log_retain_entries.to_string(),
                &format!("at most log_max_entries ({})", self.log_max_entries),
            ));
        }
        if self.phishing_url.trim().is_empty() {
            return Err(invalid("phishing_url", "", "a non-empty placeholder link"));
        }
        Ok(())
    }

    /// Shutdown bound as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn invalid(field: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}
