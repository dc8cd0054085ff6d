//! Command-line interface
//!
//! Argument definitions and command handlers for the `cyberdrill` binary.

pub mod args;
pub mod commands;
