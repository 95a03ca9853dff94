//! Light configuration schema
//!
//! Serde types for light configuration files. Durations are written in
//! human form (`4s`, `1500ms`, `1m`) and parsed with `humantime`.
//!
//! ```yaml
//! light:
//!   name: main-street
//!   min_cycle: 4s
//!   max_cycle: 6s
//!   poll_interval: 1ms
//!   mode: polling
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest time a phase is held by default.
pub const DEFAULT_MIN_CYCLE: Duration = Duration::from_millis(4000);

/// Longest time a phase is held by default.
pub const DEFAULT_MAX_CYCLE: Duration = Duration::from_millis(6000);

/// Sleep between elapsed-time checks in [`CycleMode::Polling`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Top-Level Document
// ============================================================================

/// A light configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightFile {
    /// Settings for the light.
    #[serde(default)]
    pub light: LightConfig,
}

// ============================================================================
// Light Settings
// ============================================================================

/// How the cycling thread waits out a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    /// Wake every `poll_interval` and compare elapsed time to the cycle length.
    #[default]
    Polling,
    /// Sleep once for the whole cycle.
    Sleep,
}

impl CycleMode {
    /// Lowercase name, as used in logs and config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Sleep => "sleep",
        }
    }
}

impl std::fmt::Display for CycleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and identity settings for one light.
///
/// Each phase lasts a whole number of milliseconds drawn uniformly from
/// `[min_cycle, max_cycle]`, redrawn after every flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    /// Display name, used in logs, events and the thread name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Lower bound of the cycle duration (inclusive).
    #[serde(with = "duration_format")]
    pub min_cycle: Duration,

    /// Upper bound of the cycle duration (inclusive).
    #[serde(with = "duration_format")]
    pub max_cycle: Duration,

    /// Polling quantum; ignored in [`CycleMode::Sleep`].
    #[serde(with = "duration_format")]
    pub poll_interval: Duration,

    /// Waiting strategy of the cycling thread.
    pub mode: CycleMode,

    /// Fixed RNG seed for reproducible cycle durations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            name: None,
            min_cycle: DEFAULT_MIN_CYCLE,
            max_cycle: DEFAULT_MAX_CYCLE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            mode: CycleMode::Polling,
            seed: None,
        }
    }
}

impl LightConfig {
    /// Returns the configured name, or `"light"` when unnamed.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("light")
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets both cycle bounds.
    #[must_use]
    pub const fn with_cycle(mut self, min: Duration, max: Duration) -> Self {
        self.min_cycle = min;
        self.max_cycle = max;
        self
    }

    /// Sets the polling quantum.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the waiting strategy.
    #[must_use]
    pub const fn with_mode(mut self, mode: CycleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fixes the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cycle bounds in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn cycle_bounds_ms(&self) -> (u64, u64) {
        (duration_ms(self.min_cycle), duration_ms(self.max_cycle))
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serde adapter for human-readable durations (`"4s"`, `"250ms"`).
pub mod duration_format {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a duration as a `humantime` string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    /// Deserializes a duration from a `humantime` string.
    ///
    /// # Errors
    ///
    /// Returns a deserializer error for strings `humantime` cannot parse.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid duration '{raw}': {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LightConfig::default();
        assert_eq!(config.min_cycle, Duration::from_millis(4000));
        assert_eq!(config.max_cycle, Duration::from_millis(6000));
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.mode, CycleMode::Polling);
        assert_eq!(config.cycle_bounds_ms(), (4000, 6000));
        assert_eq!(config.display_name(), "light");
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r"
light:
  name: main-street
  min_cycle: 1500ms
  max_cycle: 2s
  poll_interval: 5ms
  mode: sleep
  seed: 42
";
        let file: LightFile = serde_yaml::from_str(yaml).unwrap();
        let light = file.light;
        assert_eq!(light.display_name(), "main-street");
        assert_eq!(light.min_cycle, Duration::from_millis(1500));
        assert_eq!(light.max_cycle, Duration::from_secs(2));
        assert_eq!(light.poll_interval, Duration::from_millis(5));
        assert_eq!(light.mode, CycleMode::Sleep);
        assert_eq!(light.seed, Some(42));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let file: LightFile = serde_yaml::from_str("light:\n  max_cycle: 8s\n").unwrap();
        assert_eq!(file.light.min_cycle, DEFAULT_MIN_CYCLE);
        assert_eq!(file.light.max_cycle, Duration::from_secs(8));
        assert_eq!(file.light.mode, CycleMode::Polling);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<LightFile, _> =
            serde_yaml::from_str("light:\n  min_cycle: 4s\n  colour: amber\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_duration_rejected() {
        let err = serde_yaml::from_str::<LightFile>("light:\n  min_cycle: soon\n").unwrap_err();
        assert!(err.to_string().contains("invalid duration 'soon'"));
    }

    #[test]
    fn test_serialize_round_trips_durations() {
        let config = LightConfig::default()
            .with_name("x")
            .with_cycle(Duration::from_millis(40), Duration::from_millis(60));
        let yaml = serde_yaml::to_string(&LightFile { light: config.clone() }).unwrap();
        assert!(yaml.contains("min_cycle: 40ms"));
        let back: LightFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.light, config);
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(12)), 12);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
