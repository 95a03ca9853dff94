//! Error types for `trafficlight`
//!
//! A top-level error that aggregates configuration, light lifecycle and I/O
//! failures, plus the process exit codes each one maps to.

use std::time::Duration;
use thiserror::Error;

pub use trafficlight_core::error::{ConfigError, Severity, ValidationIssue};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `trafficlight` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Light lifecycle error (double start, thread spawn failure)
    pub const LIGHT_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `trafficlight` operations.
#[derive(Debug, Error)]
pub enum TrafficLightError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Light lifecycle error
    #[error(transparent)]
    Light(#[from] LightError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrafficLightError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Light(_) => ExitCode::LIGHT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Light Errors
// ============================================================================

/// Errors raised by [`TrafficLight`](crate::light::TrafficLight).
#[derive(Debug, Error)]
pub enum LightError {
    /// `start` was called on a light that has already been started
    #[error("light '{0}' has already been started")]
    AlreadyStarted(String),

    /// The cycling thread could not be created
    #[error("failed to spawn cycling thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// No green phase arrived before the deadline
    #[error("no green phase within {}", humantime::format_duration(*.waited))]
    Timeout {
        /// How long the caller waited
        waited: Duration,
    },

    /// The cycling thread panicked; reported when it is joined
    #[error("cycling thread panicked")]
    ThreadPanicked,
}
