//! Version information display

use serde::Serialize;

use crate::cli::args::{OutputFormat, VersionArgs};

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    rust_version: &'static str,
}

const INFO: VersionInfo = VersionInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    rust_version: env!("CARGO_PKG_RUST_VERSION"),
};

/// Print version information.
pub fn run(args: &VersionArgs) {
    match args.format {
        OutputFormat::Human => println!("{} {}", INFO.name, INFO.version),
        OutputFormat::Json => match serde_json::to_string(&INFO) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("failed to serialize version info: {e}"),
        },
    }
}
