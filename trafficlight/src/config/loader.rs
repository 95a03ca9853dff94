//! Configuration loader
//!
//! Loading pipeline:
//! 1. Read the YAML file
//! 2. Deserialize to `LightFile`
//! 3. Apply environment overrides
//! 4. Validate
//!
//! Command-line flags are applied on top of the result by the `run` command,
//! which validates again.

use std::path::Path;
use std::time::Duration;

use trafficlight_core::config::{LightConfig, LightFile};

use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

/// Overrides `light.min_cycle`, in whole milliseconds.
pub const MIN_CYCLE_ENV: &str = "TRAFFICLIGHT_MIN_CYCLE_MS";

/// Overrides `light.max_cycle`, in whole milliseconds.
pub const MAX_CYCLE_ENV: &str = "TRAFFICLIGHT_MAX_CYCLE_MS";

/// Overrides `light.poll_interval`, in whole milliseconds.
pub const POLL_INTERVAL_ENV: &str = "TRAFFICLIGHT_POLL_INTERVAL_MS";

// ============================================================================
// Public API
// ============================================================================

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: LightConfig,

    /// Warnings encountered during validation.
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    validator: Validator,
}

impl ConfigLoader {
    /// Creates a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads, overrides from the process environment, and validates `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if the file does not exist,
    /// [`ConfigError::ParseError`] on unreadable or malformed YAML,
    /// [`ConfigError::InvalidValue`] for a malformed environment override,
    /// and [`ConfigError::ValidationError`] if validation finds errors.
    pub fn load(&mut self, path: &Path) -> Result<LoadResult, ConfigError> {
        self.load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), reading overrides through `env`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with_env<F>(&mut self, path: &Path, env: F) -> Result<LoadResult, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = read_file(path)?;
        apply_env_overrides(&mut config, env)?;
        tracing::debug!(path = %path.display(), ?config, "configuration loaded");
        self.finish(&path.display().to_string(), config)
    }

    /// Validates an already assembled configuration.
    ///
    /// `source` names where the configuration came from in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if validation finds errors.
    pub fn finish(&mut self, source: &str, config: LightConfig) -> Result<LoadResult, ConfigError> {
        let result = self.validator.validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.to_string(),
                errors: result.errors,
            });
        }
        for warning in &result.warnings {
            tracing::warn!(source, "{warning}");
        }
        Ok(LoadResult {
            config,
            warnings: result.warnings,
        })
    }
}

/// Reads and parses `path` without overrides or validation.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] or [`ConfigError::ParseError`].
pub fn read_file(path: &Path) -> Result<LightConfig, ConfigError> {
    let text = read_config(path)?;
    Ok(parse(path, &text)?.light)
}

/// Applies `TRAFFICLIGHT_*_MS` overrides read through `env`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if a set variable is not a whole
/// number of milliseconds.
pub fn apply_env_overrides<F>(config: &mut LightConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ms) = env_millis(&env, MIN_CYCLE_ENV)? {
        config.min_cycle = ms;
    }
    if let Some(ms) = env_millis(&env, MAX_CYCLE_ENV)? {
        config.max_cycle = ms;
    }
    if let Some(ms) = env_millis(&env, POLL_INTERVAL_ENV)? {
        config.poll_interval = ms;
    }
    Ok(())
}

// ============================================================================
// Internals
// ============================================================================

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: e.to_string(),
            }
        }
    })
}

fn parse(path: &Path, text: &str) -> Result<LightFile, ConfigError> {
    // An empty document means "all defaults"
    if text.trim().is_empty() {
        return Ok(LightFile::default());
    }
    serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })
}

fn env_millis<F>(env: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw,
            expected: "a whole number of milliseconds".to_string(),
        })
}
