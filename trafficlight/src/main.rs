//! `trafficlight` - run and inspect traffic light actors

use clap::Parser;

use trafficlight::cli::args::{Cli, Commands};
use trafficlight::cli::commands;
use trafficlight::error::ExitCode;
use trafficlight::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let format = match &cli.command {
            Commands::Run(args) => args.log_format,
            _ => LogFormat::Human,
        };
        init_logging(format, cli.verbose, cli.color);
    }

    // The run command stops gracefully on the first Ctrl+C; a second one
    // forces the exit.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(ExitCode::INTERRUPTED);
        }
    });

    let result = commands::dispatch(cli).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
