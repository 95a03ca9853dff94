//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod run;
pub mod validate;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::error::TrafficLightError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), TrafficLightError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cli.quiet).await,
        Commands::Validate(args) => validate::run(&args, cli.quiet),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
