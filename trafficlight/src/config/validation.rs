//! Configuration validation
//!
//! Semantic checks on a fully resolved `LightConfig`. Validation collects
//! every issue instead of stopping at the first, so a single run reports
//! everything wrong with a file.

use std::time::Duration;

use trafficlight_core::config::{CycleMode, LightConfig};

use crate::error::{Severity, ValidationIssue};

/// Cycles shorter than this are allowed but flagged.
const SHORT_CYCLE_WARNING: Duration = Duration::from_millis(100);

/// Longest accepted light name.
const MAX_NAME_LEN: usize = 64;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a light configuration and returns every issue found.
    pub fn validate(&mut self, config: &LightConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_name(config);
        self.validate_cycle(config);
        self.validate_poll_interval(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_name(&mut self, config: &LightConfig) {
        match config.name.as_deref() {
            None => self.add_warning("light.name", "Light has no name; using \"light\""),
            Some("") => self.add_error("light.name", "Light name cannot be empty"),
            Some(name) => {
                // The name becomes the thread name, which may not contain NUL
                if name.contains('\0') {
                    self.add_error("light.name", "Light name cannot contain NUL bytes");
                }
                if name.len() > MAX_NAME_LEN {
                    self.add_error(
                        "light.name",
                        &format!("Light name exceeds {MAX_NAME_LEN} characters"),
                    );
                }
            }
        }
    }

    fn validate_cycle(&mut self, config: &LightConfig) {
        if config.min_cycle.is_zero() {
            self.add_error("light.min_cycle", "Minimum cycle must be greater than zero");
        }
        if config.max_cycle.is_zero() {
            self.add_error("light.max_cycle", "Maximum cycle must be greater than zero");
        }
        if config.min_cycle > config.max_cycle {
            self.add_error(
                "light.max_cycle",
                &format!(
                    "Maximum cycle ({}) is shorter than minimum cycle ({})",
                    humantime::format_duration(config.max_cycle),
                    humantime::format_duration(config.min_cycle),
                ),
            );
        }
        if !config.min_cycle.is_zero() && config.min_cycle < SHORT_CYCLE_WARNING {
            self.add_warning(
                "light.min_cycle",
                "Cycles under 100ms flip faster than scheduling jitter",
            );
        }
        if config.min_cycle.subsec_nanos() % 1_000_000 != 0
            || config.max_cycle.subsec_nanos() % 1_000_000 != 0
        {
            self.add_warning(
                "light.min_cycle",
                "Cycle bounds are truncated to whole milliseconds",
            );
        }
    }

    fn validate_poll_interval(&mut self, config: &LightConfig) {
        if config.mode == CycleMode::Sleep {
            return;
        }
        if config.poll_interval.is_zero() {
            self.add_error(
                "light.poll_interval",
                "Poll interval must be greater than zero",
            );
        } else if config.poll_interval > config.min_cycle {
            self.add_error(
                "light.poll_interval",
                "Poll interval cannot exceed the minimum cycle",
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
