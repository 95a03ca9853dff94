//! Command-line interface
//!
//! Argument parsing and command handlers for the `trafficlight` binary.

pub mod args;
pub mod commands;
