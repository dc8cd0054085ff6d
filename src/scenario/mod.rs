//! Scenario generator.
//!
//! Produces one simulated attacker action per call, polymorphic over the
//! current [`Mode`]. Generation is pure string formatting over fixed
//! candidate sets plus a Bernoulli draw for simulated success; the caller
//! supplies the randomness source so runs can be made deterministic.
//!
//! # Modes
//!
//! | Mode | Candidate set | Success chance |
//! |------|---------------|----------------|
//! | `bruteforce` | password guesses | 5% |
//! | `sqli` | injection fragments | 4% |
//! | `xss` | script fragments | 3% |
//! | `phishing` | email templates | 2% |
//! | `portscan` | port list | never |

pub mod templates;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Message returned while the attacker is stopped or has already won.
pub const IDLE_MESSAGE: &str = "Attacker is idle.";

/// Message for a mode name the generator does not know.
pub const FALLBACK_MESSAGE: &str = "Attacker performed an unknown simulated action.";

/// Default simulated target port (SSH).
pub const DEFAULT_TARGET_PORT: u16 = 22;

// ============================================================================
// Mode
// ============================================================================

/// Scenario family driving which templates the attacker uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Password guessing against a login.
    #[default]
    Bruteforce,
    /// SQL-injection-shaped payloads against a form.
    Sqli,
    /// Script injection into a form field.
    Xss,
    /// Phishing emails to staff.
    Phishing,
    /// Port probing. Never succeeds.
    Portscan,
}

impl Mode {
    /// Every mode, in display order.
    pub const ALL: [Self; 5] = [
        Self::Bruteforce,
        Self::Sqli,
        Self::Xss,
        Self::Phishing,
        Self::Portscan,
    ];

    /// Lowercase name used in commands, logs, and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bruteforce => "bruteforce",
            Self::Sqli => "sqli",
            Self::Xss => "xss",
            Self::Phishing => "phishing",
            Self::Portscan => "portscan",
        }
    }

    /// Probability that a single attempt is reported as a simulated success.
    #[must_use]
    pub const fn success_probability(self) -> f64 {
        match self {
            Self::Bruteforce => 0.05,
            Self::Sqli => 0.04,
            Self::Xss => 0.03,
            Self::Phishing => 0.02,
            Self::Portscan => 0.0,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| InputError::InvalidMode(s.to_string()))
    }
}

/// Suggest a mode name for a mistyped one.
///
/// Returns the closest match if its Damerau-Levenshtein distance is ≤ 3.
#[must_use]
pub fn suggest_mode(input: &str) -> Option<&'static str> {
    let input = input.trim().to_ascii_lowercase();
    Mode::ALL
        .iter()
        .map(|m| (m.as_str(), strsim::damerau_levenshtein(&input, m.as_str())))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name)
}

// ============================================================================
// Step generation
// ============================================================================

/// One generated attacker action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Human-readable log line.
    pub text: String,
    /// Whether this attempt is a simulated success.
    pub success: bool,
}

impl Step {
    fn attempt(text: String) -> Self {
        Self {
            text,
            success: false,
        }
    }

    fn success(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }

    /// A step that did nothing.
    #[must_use]
    pub fn idle() -> Self {
        Self::attempt(IDLE_MESSAGE.to_string())
    }
}

/// Scenario-specific text substituted into templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    /// Link embedded in phishing emails.
    pub phishing_url: String,
}

impl Default for ScenarioContext {
    fn default() -> Self {
        Self {
            phishing_url: templates::DEFAULT_PHISHING_URL.to_string(),
        }
    }
}

/// Generates one action for `mode`.
///
/// Pure apart from the draws taken from `rng`.
pub fn generate_step<R: Rng>(mode: Mode, context: &ScenarioContext, rng: &mut R) -> Step {
    match mode {
        Mode::Bruteforce => {
            let pw = pick(&templates::PASSWORDS, rng);
            if roll(mode, rng) {
                Step::success(format!(
                    "Attacker SUCCESS: simulated login using password '{pw}' (simulated)."
                ))
            } else {
                Step::attempt(format!(
                    "Attacker tried login with password '{pw}' (simulated attempt)."
                ))
            }
        }
        Mode::Sqli => {
            let payload = pick(&templates::SQLI_FRAGMENTS, rng);
            if roll(mode, rng) {
                Step::success(format!(
                    "Attacker SUCCESS: simulated SQL injection payload '{payload}' appeared to bypass filters (simulated)."
                ))
            } else {
                Step::attempt(format!(
                    "Attacker attempted SQLi-like payload '{payload}' against /login (simulated)."
                ))
            }
        }
        Mode::Xss => {
            let payload = pick(&templates::XSS_FRAGMENTS, rng);
            if roll(mode, rng) {
                Step::success(format!(
                    "Attacker SUCCESS: simulated XSS payload '{payload}' executed in simulated context."
                ))
            } else {
                Step::attempt(format!(
                    "Attacker injected XSS-like string '{payload}' into a form field (simulated)."
                ))
            }
        }
        Mode::Phishing => {
            let msg = pick(&templates::PHISHING_TEMPLATES, rng).replace("{url}", &context.phishing_url);
            if roll(mode, rng) {
                Step::success(format!(
                    "Attacker SUCCESS: a simulated recipient clicked a malicious link. Email: \"{msg}\""
                ))
            } else {
                Step::attempt(format!("Attacker sent phishing email: \"{msg}\" (simulated)."))
            }
        }
        Mode::Portscan => {
            let port = templates::SCAN_PORTS
                .choose(rng)
                .copied()
                .unwrap_or(DEFAULT_TARGET_PORT);
            Step::attempt(format!("Attacker probed port {port} (simulated)."))
        }
    }
}

/// Generates one action for a mode given by name.
///
/// Unknown names produce [`FALLBACK_MESSAGE`] and never succeed.
pub fn generate_named_step<R: Rng>(
    mode: &str,
    context: &ScenarioContext,
    rng: &mut R,
) -> Step {
    mode.parse::<Mode>().map_or_else(
        |_| Step::attempt(FALLBACK_MESSAGE.to_string()),
        |m| generate_step(m, context, rng),
    )
}

fn pick<'a, R: Rng>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn roll<R: Rng>(mode: Mode, rng: &mut R) -> bool {
    let p = mode.success_probability();
    p > 0.0 && rng.random_bool(p)
}

// ============================================================================
// Attacker
// ============================================================================

/// Observable attacker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackerState {
    /// Current scenario.
    pub mode: Mode,
    /// Attempts generated since the last reset.
    pub attempts: u64,
    /// Latched once a simulated success is drawn.
    pub succeeded: bool,
    /// Cleared while the attacker is blocked.
    pub active: bool,
}

impl Default for AttackerState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            attempts: 0,
            succeeded: false,
            active: true,
        }
    }
}

/// Stateful simulated attacker.
///
/// Wraps [`generate_step`] with the attempt counter and the success latch:
/// once a success is drawn, [`launch`](Self::launch) idles until
/// [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct Attacker {
    state: AttackerState,
    context: ScenarioContext,
    target_port: u16,
}

impl Attacker {
    /// Creates an attacker aimed at `target_port`, starting in `mode`.
    #[must_use]
    pub fn new(mode: Mode, target_port: u16) -> Self {
        Self {
            state: AttackerState {
                mode,
                ..AttackerState::default()
            },
            context: ScenarioContext::default(),
            target_port,
        }
    }

    /// Replaces the template context.
    #[must_use]
    pub fn with_context(mut self, context: ScenarioContext) -> Self {
        self.context = context;
        self
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub const fn state(&self) -> AttackerState {
        self.state
    }

    /// Current scenario mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Port the simulated attacker is going after.
    #[must_use]
    pub const fn target_port(&self) -> u16 {
        self.target_port
    }

    /// Switches scenario. Attempts and the success latch are untouched.
    pub const fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
    }

    /// Parses and switches scenario.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidMode`] if `mode` is not one of the five
    /// scenario names; the current mode is kept.
    pub fn set_mode_str(&mut self, mode: &str) -> Result<Mode, InputError> {
        let parsed = mode.parse::<Mode>()?;
        self.set_mode(parsed);
        Ok(parsed)
    }

    /// Performs one simulated action.
    ///
    /// Returns the idle step without counting an attempt when stopped or
    /// after a success.
    pub fn launch<R: Rng>(&mut self, rng: &mut R) -> Step {
        if !self.state.active || self.state.succeeded {
            return Step::idle();
        }

        self.state.attempts = self.state.attempts.saturating_add(1);
        let step = generate_step(self.state.mode, &self.context, rng);
        if step.success {
            self.state.succeeded = true;
        }
        step
    }

    /// Stops the attacker.
    pub const fn stop(&mut self) -> &'static str {
        self.state.active = false;
        "Attacker stopped (simulated)."
    }

    /// Restores attempts, success latch, activity, and the default mode.
    pub fn reset(&mut self) -> &'static str {
        self.state = AttackerState::default();
        "Attacker reset (simulated)."
    }
}

impl Default for Attacker {
    fn default() -> Self {
        Self::new(Mode::default(), DEFAULT_TARGET_PORT)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn mode_parse_is_case_and_whitespace_insensitive() {
        assert_eq!("  SQLi ".parse::<Mode>().unwrap(), Mode::Sqli);
        assert_eq!("PortScan".parse::<Mode>().unwrap(), Mode::Portscan);
    }

    #[test]
    fn mode_parse_rejects_unknown() {
        let err = "ddos".parse::<Mode>().unwrap_err();
        assert_eq!(err, InputError::InvalidMode("ddos".to_string()));
    }

    #[test]
    fn mode_display_round_trips() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn suggest_close_mode() {
        assert_eq!(suggest_mode("sqly"), Some("sqli"));
        assert_eq!(suggest_mode("phishng"), Some("phishing"));
        assert_eq!(suggest_mode("completely-different"), None);
    }

    #[test]
    fn each_mode_uses_its_template_family() {
        let ctx = ScenarioContext::default();
        let mut rng = rng();
        let cases = [
            (Mode::Bruteforce, "password"),
            (Mode::Sqli, "payload"),
            (Mode::Xss, "XSS"),
            (Mode::Phishing, "phishing email"),
            (Mode::Portscan, "probed port"),
        ];
        for (mode, needle) in cases {
            // Skip past the rare success wording; attempt lines carry the needle
            let step = (0..50)
                .map(|_| generate_step(mode, &ctx, &mut rng))
                .find(|s| !s.success)
                .unwrap();
            assert!(
                step.text.contains(needle),
                "{mode}: '{}' lacks '{needle}'",
                step.text
            );
        }
    }

    #[test]
    fn phishing_substitutes_context_url() {
        let ctx = ScenarioContext {
            phishing_url: "http://training.invalid/login".to_string(),
        };
        let step = generate_step(Mode::Phishing, &ctx, &mut rng());
        assert!(step.text.contains("http://training.invalid/login"));
        assert!(!step.text.contains("{url}"));
    }

    #[test]
    fn portscan_never_succeeds() {
        let ctx = ScenarioContext::default();
        let mut rng = rng();
        for _ in 0..1_000 {
            let step = generate_step(Mode::Portscan, &ctx, &mut rng);
            assert!(!step.success);
            assert!(step.text.starts_with("Attacker probed port"));
        }
    }

    #[test]
    fn bruteforce_success_rate_near_five_percent() {
        let ctx = ScenarioContext::default();
        let mut rng = StdRng::seed_from_u64(42);
        let successes = (0..10_000)
            .filter(|_| generate_step(Mode::Bruteforce, &ctx, &mut rng).success)
            .count();
        assert!(
            (350..=650).contains(&successes),
            "unexpected success count {successes}"
        );
    }

    #[test]
    fn same_seed_same_steps() {
        let ctx = ScenarioContext::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for mode in Mode::ALL {
            assert_eq!(
                generate_step(mode, &ctx, &mut a),
                generate_step(mode, &ctx, &mut b)
            );
        }
    }

    #[test]
    fn unknown_named_mode_falls_back() {
        let step = generate_named_step("ransomware", &ScenarioContext::default(), &mut rng());
        assert_eq!(step.text, FALLBACK_MESSAGE);
        assert!(!step.success);
    }

    #[test]
    fn launch_counts_attempts() {
        let mut attacker = Attacker::new(Mode::Portscan, 22);
        let mut rng = rng();
        for _ in 0..3 {
            attacker.launch(&mut rng);
        }
        assert_eq!(attacker.state().attempts, 3);
    }

    #[test]
    fn success_latches_until_reset() {
        let mut attacker = Attacker::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut attempts_at_success = None;
        for _ in 0..2_000 {
            let step = attacker.launch(&mut rng);
            if step.success {
                attempts_at_success = Some(attacker.state().attempts);
                break;
            }
        }
        let attempts = attempts_at_success.expect("a 5% draw should land within 2000 tries");

        for _ in 0..20 {
            let step = attacker.launch(&mut rng);
            assert_eq!(step.text, IDLE_MESSAGE);
            assert!(!step.success);
        }
        assert_eq!(attacker.state().attempts, attempts);
        assert!(attacker.state().succeeded);

        attacker.reset();
        assert_eq!(attacker.state(), AttackerState::default());
    }

    #[test]
    fn stopped_attacker_idles() {
        let mut attacker = Attacker::default();
        attacker.stop();
        let step = attacker.launch(&mut rng());
        assert_eq!(step, Step::idle());
        assert_eq!(attacker.state().attempts, 0);
    }

    #[test]
    fn set_mode_str_rejects_and_keeps_mode() {
        let mut attacker = Attacker::new(Mode::Xss, 22);
        assert!(attacker.set_mode_str("worm").is_err());
        assert_eq!(attacker.mode(), Mode::Xss);
        assert_eq!(attacker.set_mode_str("PHISHING").unwrap(), Mode::Phishing);
        assert_eq!(attacker.mode(), Mode::Phishing);
    }

    #[test]
    fn reset_returns_to_bruteforce() {
        let mut attacker = Attacker::new(Mode::Sqli, 2222);
        attacker.reset();
        assert_eq!(attacker.mode(), Mode::Bruteforce);
        assert_eq!(attacker.target_port(), 2222);
    }
}
