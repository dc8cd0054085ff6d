//! Stealth levels and the autonomous step delay they imply.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Symmetric jitter added to every drawn delay, in seconds.
pub const JITTER_SECS: f64 = 0.5;

/// How often the simulated attacker acts on its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    /// Noisy: a step every one to four seconds.
    Low,
    /// A step every five to eleven seconds.
    #[default]
    Medium,
    /// Quiet: a step every twelve to twenty-eight seconds.
    High,
}

impl StealthLevel {
    /// Every level, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Lowercase name used in commands, logs, and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Base delay range in seconds, before jitter.
    #[must_use]
    pub const fn delay_bounds_secs(self) -> (f64, f64) {
        match self {
            Self::Low => (0.8, 3.5),
            Self::Medium => (4.5, 11.0),
            Self::High => (12.0, 28.0),
        }
    }

    /// Draws the pause before the next autonomous step.
    ///
    /// Uniform over the level's range plus uniform jitter in
    /// `±JITTER_SECS`, floored at zero.
    pub fn next_delay<R: Rng>(self, rng: &mut R) -> Duration {
        let (lo, hi) = self.delay_bounds_secs();
        let base = rng.random_range(lo..=hi);
        let jitter = rng.random_range(-JITTER_SECS..=JITTER_SECS);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }
}

impl fmt::Display for StealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StealthLevel {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == needle)
            .ok_or_else(|| InputError::InvalidStealth(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_is_medium() {
        assert_eq!(StealthLevel::default(), StealthLevel::Medium);
    }

    #[test]
    fn parse_levels() {
        assert_eq!("LOW".parse::<StealthLevel>().unwrap(), StealthLevel::Low);
        assert_eq!(" high ".parse::<StealthLevel>().unwrap(), StealthLevel::High);
        assert_eq!(
            "extreme".parse::<StealthLevel>().unwrap_err(),
            InputError::InvalidStealth("extreme".to_string())
        );
    }

    #[test]
    fn delays_stay_within_jittered_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for level in StealthLevel::ALL {
            let (lo, hi) = level.delay_bounds_secs();
            for _ in 0..500 {
                let d = level.next_delay(&mut rng).as_secs_f64();
                assert!(d >= lo - JITTER_SECS - 1e-9, "{level}: {d} below range");
                assert!(d <= hi + JITTER_SECS + 1e-9, "{level}: {d} above range");
            }
        }
    }

    #[test]
    fn higher_stealth_means_longer_pauses() {
        let mut rng = StdRng::seed_from_u64(11);
        let mean = |level: StealthLevel, rng: &mut StdRng| {
            (0..200)
                .map(|_| level.next_delay(rng).as_secs_f64())
                .sum::<f64>()
                / 200.0
        };
        let low = mean(StealthLevel::Low, &mut rng);
        let medium = mean(StealthLevel::Medium, &mut rng);
        let high = mean(StealthLevel::High, &mut rng);
        assert!(low < medium && medium < high);
    }
}
