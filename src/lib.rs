//! `cyberdrill` - educational attacker-versus-defender drill simulator
//!
//! A scenario generator produces simulated attacker log lines for one of
//! several attack categories, and a session coordinator runs them on a
//! stealth-dependent cadence while an operator issues defensive commands.
//! Nothing here touches a real network or system.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod scenario;
pub mod session;
