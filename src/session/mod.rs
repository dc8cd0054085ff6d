//! Drill session coordinator
//!
//! A [`Session`] owns all mutable drill state behind one mutex and runs the
//! autonomous attacker loop as a tokio task. Synchronous operator calls and
//! the loop serialize through the same lock, so neither can observe a torn
//! state.
//!
//! # Loop states
//!
//! ```text
//!            ufw deny (target port)
//!   Running ─────────────────────────▶ Blocked
//!      │  ▲                               │
//!      │  └───────────── reset ◀──────────┘
//!      │  success draw          ▲
//!      └───────────▶ Succeeded ─┘ reset
//!
//!   any ── stop() ──▶ Stopped (terminal)
//! ```
//!
//! The loop keeps cycling while blocked or succeeded but generates nothing.
//! The lock is never held across the sleep between cycles.

pub mod command;
pub mod history;
pub mod stealth;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::InputError;
use crate::observability::metrics;
use crate::scenario::{Attacker, Mode, ScenarioContext, suggest_mode};

pub use command::Command;
pub use history::LogHistory;
pub use stealth::StealthLevel;

/// Log lines returned by the `tail` command.
pub const TAIL_LINES: usize = 20;

/// Log lines included in a status snapshot.
pub const STATUS_TAIL_LINES: usize = 40;

/// Reply to a manual step while blocked.
pub const ALREADY_BLOCKED: &str = "Attacker already blocked.";

/// Reply to `tail` on an empty history.
pub const NO_LOGS: &str = "No logs yet.";

/// Reply to a matching block rule.
pub const BLOCK_APPLIED: &str = "✅ Firewall rule applied. Attacker blocked.";

/// Reply to anything outside the grammar.
pub const UNRECOGNIZED: &str = "❌ Unrecognized or ineffective command. Try 'tail', 'set stealth <level>', 'set mode <mode>', 'ufw deny ...', or 'reset'.";

/// Reply to `set stealth` without a level.
pub const STEALTH_USAGE: &str = "Usage: set stealth <low|medium|high>";

/// Reply to `set mode` without a mode.
pub const MODE_USAGE: &str = "Usage: set mode <bruteforce|sqli|xss|phishing|portscan>";

const BLOCK_LOG: &str = "✅ Firewall rule applied (simulated). Attacker blocked.";
const RESET_LOG: &str = "System reset by instructor/user (simulated).";

// ============================================================================
// Status snapshot
// ============================================================================

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// A matching block rule is in force.
    pub blocked: bool,
    /// The attacker has won this scenario.
    pub success: bool,
    /// Attempts since the last reset.
    pub attempts: u64,
    /// Current stealth level.
    pub stealth: StealthLevel,
    /// Current scenario.
    pub mode: Mode,
    /// Newest log lines, oldest first, at most [`STATUS_TAIL_LINES`].
    pub logs_tail: Vec<String>,
    /// Total lines currently held.
    pub log_count: usize,
}

// ============================================================================
// Locked state
// ============================================================================

/// Everything guarded by the session lock.
struct SessionState {
    attacker: Attacker,
    blocked: bool,
    stealth: StealthLevel,
    history: LogHistory,
    rng: StdRng,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        let context = ScenarioContext {
            phishing_url: config.phishing_url.clone(),
        };
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            attacker: Attacker::new(config.mode, config.target_port).with_context(context),
            blocked: false,
            stealth: config.stealth,
            history: LogHistory::new(config.log_max_entries, config.log_retain_entries),
            rng,
        }
    }

    /// Launches one attacker action and records it.
    fn launch(&mut self) -> String {
        let mode = self.attacker.mode();
        let attempts_before = self.attacker.state().attempts;
        let step = self.attacker.launch(&mut self.rng);
        if self.attacker.state().attempts > attempts_before {
            metrics::record_step(mode, step.success);
        }
        if step.success {
            info!(mode = %mode, "simulated attacker succeeded");
        }
        self.history.append(&step.text);
        step.text
    }

    fn step(&mut self) -> String {
        if self.blocked {
            return ALREADY_BLOCKED.to_string();
        }
        self.launch()
    }

    /// One autonomous cycle. Returns the pause before the next one.
    fn autonomous_cycle(&mut self) -> Duration {
        if !self.blocked && !self.attacker.state().succeeded {
            let text = self.launch();
            debug!(line = %text, "autonomous step");
        }
        self.stealth.next_delay(&mut self.rng)
    }

    fn execute(&mut self, command: Command) -> String {
        metrics::record_command(command.kind());
        match command {
            Command::Block { source, port } if port == self.attacker.target_port() => {
                self.block(source.as_deref())
            }
            Command::Block { .. } | Command::Unknown(_) => UNRECOGNIZED.to_string(),
            Command::Tail => self.tail(),
            Command::SetStealth(Some(level)) => self.set_stealth(&level),
            Command::SetStealth(None) => STEALTH_USAGE.to_string(),
            Command::SetMode(Some(mode)) => self.set_mode(&mode),
            Command::SetMode(None) => MODE_USAGE.to_string(),
            Command::Reset => self.reset(),
        }
    }

    fn block(&mut self, source: Option<&str>) -> String {
        self.blocked = true;
        self.attacker.stop();
        self.history.append(BLOCK_LOG);
        metrics::set_blocked(true);
        info!(
            source = source.unwrap_or("any"),
            port = self.attacker.target_port(),
            "attacker blocked"
        );
        BLOCK_APPLIED.to_string()
    }

    fn tail(&self) -> String {
        if self.history.is_empty() {
            NO_LOGS.to_string()
        } else {
            self.history.tail(TAIL_LINES).join("\n")
        }
    }

    fn set_stealth(&mut self, level: &str) -> String {
        match level.parse::<StealthLevel>() {
            Ok(level) => self.set_stealth_level(level),
            Err(err) => err.to_string(),
        }
    }

    fn set_stealth_level(&mut self, level: StealthLevel) -> String {
        self.stealth = level;
        info!(stealth = %level, "stealth changed");
        format!("Stealth set to {level}")
    }

    fn set_mode(&mut self, mode: &str) -> String {
        match mode.parse::<Mode>() {
            Ok(mode) => self.set_scenario_mode(mode),
            Err(err) => rejected_mode(&err),
        }
    }

    fn set_scenario_mode(&mut self, mode: Mode) -> String {
        self.attacker.set_mode(mode);
        self.history
            .append(&format!("Scenario changed to '{mode}' (instructor action)."));
        info!(mode = %mode, "scenario changed");
        format!("Scenario mode set to {mode}")
    }

    fn reset(&mut self) -> String {
        self.blocked = false;
        let msg = self.attacker.reset();
        self.history.append(RESET_LOG);
        metrics::set_blocked(false);
        info!("session reset");
        msg.to_string()
    }

    fn status(&self) -> SessionStatus {
        let attacker = self.attacker.state();
        SessionStatus {
            blocked: self.blocked,
            success: attacker.succeeded,
            attempts: attacker.attempts,
            stealth: self.stealth,
            mode: attacker.mode,
            logs_tail: self.history.tail(STATUS_TAIL_LINES).to_vec(),
            log_count: self.history.len(),
        }
    }
}

fn rejected_mode(err: &InputError) -> String {
    match suggest_mode(err.input()) {
        Some(hint) => format!("{err} Did you mean '{hint}'?"),
        None => err.to_string(),
    }
}

// ============================================================================
// Session handle
// ============================================================================

struct Shared {
    state: Mutex<SessionState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Shared {
    // Wakes a sleeping loop so it exits without waiting out its pause.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handle to one drill session.
///
/// Cheap to clone; all clones share the same state and background loop.
/// Every operation returns a definite message and never panics, including
/// on a poisoned lock.
///
/// The loop only holds a weak reference: dropping the last `Session` ends
/// it. Call [`stop`](Self::stop) to wait for that deterministically.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Shared>,
}

impl Session {
    /// Creates a session without starting the background loop.
    ///
    /// Manual [`step`](Self::step) and commands work as usual.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(SessionState::new(config)),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
                shutdown_timeout: config.shutdown_timeout(),
            }),
        }
    }

    /// Creates a session and, when `config.autostart` is set, spawns its
    /// background loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `autostart` is set and called outside a tokio runtime.
    #[must_use]
    pub fn start(config: &SessionConfig) -> Self {
        let session = Self::new(config);
        if config.autostart {
            session.spawn_loop();
        }
        info!(
            stealth = %config.stealth,
            mode = %config.mode,
            target_port = config.target_port,
            autostart = config.autostart,
            "drill session started"
        );
        session
    }

    fn spawn_loop(&self) {
        let shared = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let Some(inner) = shared.upgrade() else {
                    break;
                };
                let delay = inner.lock().autonomous_cycle();
                drop(inner);
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
            debug!("drill loop exited");
        });
        *self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock()
    }

    /// Performs one manual attacker step, independent of the timer.
    ///
    /// Returns [`ALREADY_BLOCKED`] without generating while blocked.
    #[must_use = "the step text is the operator-facing result"]
    pub fn step(&self) -> String {
        self.lock().step()
    }

    /// Decodes and applies an operator command.
    #[must_use = "the reply is the operator-facing result"]
    pub fn apply_command(&self, input: &str) -> String {
        let command = Command::parse(input);
        self.lock().execute(command)
    }

    /// Sets the stealth level from its name.
    #[must_use = "the reply is the operator-facing result"]
    pub fn set_stealth(&self, level: &str) -> String {
        self.lock().set_stealth(level)
    }

    /// Sets the stealth level.
    #[must_use = "the reply is the operator-facing result"]
    pub fn set_stealth_level(&self, level: StealthLevel) -> String {
        self.lock().set_stealth_level(level)
    }

    /// Switches scenario by name.
    #[must_use = "the reply is the operator-facing result"]
    pub fn set_mode(&self, mode: &str) -> String {
        self.lock().set_mode(mode)
    }

    /// Switches scenario.
    #[must_use = "the reply is the operator-facing result"]
    pub fn set_scenario_mode(&self, mode: Mode) -> String {
        self.lock().set_scenario_mode(mode)
    }

    /// Returns a snapshot of the session.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    /// Whether the background loop is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Stops the background loop and waits for it, bounded by the configured
    /// shutdown timeout.
    ///
    /// A loop that does not exit in time is aborted. Idempotent; manual
    /// operations keep working afterwards.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut handle) = handle else {
            return;
        };

        match tokio::time::timeout(self.inner.shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => info!("drill session stopped"),
            Ok(Err(e)) => warn!(error = %e, "drill loop ended abnormally"),
            Err(_) => {
                handle.abort();
                warn!(
                    timeout = ?self.inner.shutdown_timeout,
                    "drill loop did not stop in time; aborted"
                );
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("Session")
            .field("blocked", &status.blocked)
            .field("success", &status.success)
            .field("mode", &status.mode)
            .field("stealth", &status.stealth)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
