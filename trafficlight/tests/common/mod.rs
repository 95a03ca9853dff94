//! Shared integration-test helpers for driving the `trafficlight` binary
//! and building fast-cycling lights.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Duration;

use trafficlight::config::LightConfig;

/// Scaled-down cycle bounds so tests flip every few tens of milliseconds.
pub const FAST_MIN: Duration = Duration::from_millis(40);
pub const FAST_MAX: Duration = Duration::from_millis(60);

/// Returns a named config cycling in `[FAST_MIN, FAST_MAX]`.
pub fn fast_config(name: &str) -> LightConfig {
    LightConfig::default()
        .with_name(name)
        .with_cycle(FAST_MIN, FAST_MAX)
}

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the binary to completion with timing overrides cleared from the
/// environment.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trafficlight"))
        .args(args)
        .env_remove("TRAFFICLIGHT_CONFIG")
        .env_remove("TRAFFICLIGHT_MIN_CYCLE_MS")
        .env_remove("TRAFFICLIGHT_MAX_CYCLE_MS")
        .env_remove("TRAFFICLIGHT_POLL_INTERVAL_MS")
        .env_remove("TRAFFICLIGHT_LOG_LEVEL")
        .output()
        .expect("failed to run trafficlight")
}
