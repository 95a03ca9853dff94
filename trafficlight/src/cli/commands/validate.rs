//! Configuration validation command
//!
//! Validates every file given, reports each one, and fails with the first
//! error once all files have been checked.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, TrafficLightError, ValidationIssue};

/// Per-file outcome, as reported in JSON mode.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl FileReport {
    fn new(path: &Path, result: &Result<Vec<ValidationIssue>, ConfigError>) -> Self {
        let file = path.display().to_string();
        match result {
            Ok(warnings) => Self {
                file,
                valid: true,
                errors: Vec::new(),
                warnings: warnings.iter().map(ToString::to_string).collect(),
            },
            Err(ConfigError::ValidationError { errors, .. }) => Self {
                file,
                valid: false,
                errors: errors.iter().map(ToString::to_string).collect(),
                warnings: Vec::new(),
            },
            Err(other) => Self {
                file,
                valid: false,
                errors: vec![other.to_string()],
                warnings: Vec::new(),
            },
        }
    }
}

/// Validate light configuration files.
///
/// # Errors
///
/// Returns the first configuration error encountered, after every file has
/// been reported.
pub fn run(args: &ValidateArgs, quiet: bool) -> Result<(), TrafficLightError> {
    let mut loader = ConfigLoader::new();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let result = loader.load(path).map(|loaded| loaded.warnings);
        reports.push(FileReport::new(path, &result));
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }

    match args.format {
        OutputFormat::Human if !quiet => {
            for report in &reports {
                print_human(report);
            }
        }
        OutputFormat::Human => {}
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn print_human(report: &FileReport) {
    if report.valid {
        println!("{}: ok", report.file);
    } else {
        println!("{}: invalid", report.file);
    }
    for error in &report.errors {
        println!("  {error}");
    }
    for warning in &report.warnings {
        println!("  {warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_all_valid_files_pass() {
        let a = temp_config("light:\n  name: a\n");
        let b = temp_config("light:\n  name: b\n  mode: sleep\n");
        let args = ValidateArgs {
            files: vec![a.path().to_path_buf(), b.path().to_path_buf()],
            format: OutputFormat::Json,
        };
        assert!(run(&args, true).is_ok());
    }

    #[test]
    fn test_reports_first_error_after_checking_all() {
        let bad = temp_config("light:\n  name: a\n  min_cycle: 0s\n");
        let args = ValidateArgs {
            files: vec![
                PathBuf::from("/no/such/light.yaml"),
                bad.path().to_path_buf(),
            ],
            format: OutputFormat::Human,
        };
        let err = run(&args, true).unwrap_err();
        assert!(matches!(
            err,
            TrafficLightError::Config(ConfigError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_report_lists_validation_errors() {
        let bad = temp_config("light:\n  name: a\n  min_cycle: 5s\n  max_cycle: 1s\n");
        let mut loader = ConfigLoader::new();
        let result = loader.load(bad.path()).map(|l| l.warnings);
        let report = FileReport::new(bad.path(), &result);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("light.max_cycle"));
    }
}
