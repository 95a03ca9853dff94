//! CLI argument definitions
//!
//! All Clap derive structs for `trafficlight` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use trafficlight_core::config::CycleMode;

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Traffic light phase actor with a blocking hand-off queue.
#[derive(Parser, Debug)]
#[command(name = "trafficlight", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "TRAFFICLIGHT_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a light and observe it until a stop condition is reached.
    Run(RunArgs),

    /// Validate light configuration files without running them.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Run Command
// ============================================================================

/// Arguments for `trafficlight run`.
///
/// Timing flags override the configuration file and environment.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Light configuration file (YAML).
    #[arg(short, long, env = "TRAFFICLIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Light name, used in logs, events and the thread name.
    #[arg(long)]
    pub name: Option<String>,

    /// Shortest cycle (e.g. `4s`, `250ms`).
    #[arg(long, value_parser = parse_duration)]
    pub min_cycle: Option<Duration>,

    /// Longest cycle (e.g. `6s`).
    #[arg(long, value_parser = parse_duration)]
    pub max_cycle: Option<Duration>,

    /// Polling quantum in polling mode (e.g. `1ms`).
    #[arg(long, value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Waiting strategy between flips.
    #[arg(long)]
    pub mode: Option<CycleMode>,

    /// Seed for the cycle length generator (reproducible runs).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after observing this many greens.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub greens: Option<u64>,

    /// Stop after this much wall-clock time (e.g. `30s`).
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Write JSONL events to this file (`-` for stdout).
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Expose Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Log output format.
    #[arg(long, default_value = "human")]
    pub log_format: LogFormat,
}

// ============================================================================
// Validate Command
// ============================================================================

/// Arguments for `trafficlight validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for `trafficlight completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    pub shell: Shell,
}

/// Arguments for `trafficlight version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Shared Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    /// Always emit ANSI colors.
    Always,
    /// Never emit ANSI colors.
    Never,
}

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bourne Again Shell.
    Bash,
    /// Z Shell.
    Zsh,
    /// Fish.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish.
    Elvish,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw).map_err(|e| format!("invalid duration '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trafficlight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_timing_flags() {
        let cli = parse(&[
            "run",
            "--min-cycle",
            "40ms",
            "--max-cycle",
            "1s 500ms",
            "--mode",
            "sleep",
            "--greens",
            "3",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.min_cycle, Some(Duration::from_millis(40)));
        assert_eq!(args.max_cycle, Some(Duration::from_millis(1500)));
        assert_eq!(args.mode, Some(CycleMode::Sleep));
        assert_eq!(args.greens, Some(3));
        assert_eq!(args.log_format, LogFormat::Human);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = Cli::try_parse_from(["trafficlight", "run", "--min-cycle", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_greens_rejected() {
        let result = Cli::try_parse_from(["trafficlight", "run", "--greens", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["version", "-vv", "--quiet", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        let Commands::Version(args) = cli.command else {
            panic!("expected version");
        };
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["trafficlight", "validate"]).is_err());
    }
}
