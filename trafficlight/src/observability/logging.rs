//! Logging initialization for `trafficlight`.
//!
//! Two kinds of thread log concurrently during a run: the light's cycling
//! thread (named `trafficlight-<light>`) and whichever thread observes it.
//! Every line carries its thread name so the two can be told apart.
//!
//! Verbosity applies to this workspace's crates only. Dependencies (the
//! Tokio runtime, the Prometheus listener) stay at `warn` until `-vvvv`.
//! `TRAFFICLIGHT_LOG_LEVEL` replaces the computed filter entirely.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "TRAFFICLIGHT_LOG_LEVEL";

/// Crates whose level follows `-v`.
const OWN_TARGETS: [&str; 2] = ["trafficlight", "trafficlight_core"];

/// Log output format.
///
/// Controls how log messages are rendered to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Level for this workspace's crates at a given `-v` count.
///
/// - 0: `warn` (validation warnings, failed shutdowns)
/// - 1: `info` (light started and stopped, greens observed)
/// - 2: `debug` (every phase flip)
/// - 3+: `trace` (cycle draws, discarded reds)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the filter directive string for `verbosity`.
#[must_use]
pub fn filter_directives(verbosity: u8) -> String {
    if verbosity >= 4 {
        return "trace".to_string();
    }
    let level = verbosity_to_directive(verbosity);
    OWN_TARGETS
        .iter()
        .fold("warn".to_string(), |acc, target| format!("{acc},{target}={level}"))
}

/// Resolves the filter: an explicit `override_directives` wins over
/// `verbosity`. Falls back to the verbosity filter if the override does
/// not parse.
fn build_filter(verbosity: u8, override_directives: Option<&str>) -> EnvFilter {
    override_directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directives(verbosity)))
}

/// Decides whether to emit ANSI colors on stderr.
fn use_ansi(color: ColorChoice, stderr_is_terminal: bool, no_color_set: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_terminal && !no_color_set,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Initializes the global tracing subscriber on stderr.
///
/// Targets are shown from `-vv` up, where per-flip events from the cycling
/// thread start to appear.
///
/// Uses `try_init()` so calling this more than once (e.g. in tests) is safe.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let env_directives = std::env::var(LOG_LEVEL_ENV).ok();
    let filter = build_filter(verbosity, env_directives.as_deref());
    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let ansi = use_ansi(
                color,
                std::io::stderr().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
            );
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(ansi)
                .with_target(show_target)
                .with_thread_names(true)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .with_target(show_target)
                .with_thread_names(true)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_default_keeps_everything_at_warn() {
        assert_eq!(
            filter_directives(0),
            "warn,trafficlight=warn,trafficlight_core=warn"
        );
    }

    #[test]
    fn verbosity_raises_only_own_crates() {
        let directives = filter_directives(2);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("trafficlight=debug"));
        assert!(directives.contains("trafficlight_core=debug"));
        assert_eq!(filter_directives(3), "warn,trafficlight=trace,trafficlight_core=trace");
    }

    #[test]
    fn four_or_more_traces_dependencies_too() {
        assert_eq!(filter_directives(4), "trace");
        assert_eq!(filter_directives(u8::MAX), "trace");
    }

    #[test]
    fn level_mapping_saturates() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(3), "trace");
        assert_eq!(verbosity_to_directive(200), "trace");
    }

    #[test]
    fn override_replaces_verbosity_filter() {
        let filter = build_filter(0, Some("trafficlight::light::cycle=trace"));
        assert_eq!(filter.to_string(), "trafficlight::light::cycle=trace");
    }

    #[test]
    fn malformed_override_falls_back() {
        let filter = build_filter(1, Some("trafficlight=[[["));
        assert!(filter.to_string().contains("trafficlight=info"));
    }

    #[test]
    fn color_choice_resolution() {
        assert!(use_ansi(ColorChoice::Auto, true, false));
        assert!(!use_ansi(ColorChoice::Auto, true, true));
        assert!(!use_ansi(ColorChoice::Auto, false, false));
        assert!(use_ansi(ColorChoice::Always, false, true));
        assert!(!use_ansi(ColorChoice::Never, true, false));
    }

    #[test]
    fn init_logging_does_not_panic() {
        // try_init is idempotent; repeated calls return Err and are ignored
        init_logging(LogFormat::Human, 0, ColorChoice::Auto);
        init_logging(LogFormat::Json, 3, ColorChoice::Never);
    }
}
