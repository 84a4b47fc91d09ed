//! fwgate - Command-line tool for Apple firmware metadata and
//! developer-portal downloads

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fwgate_cli::cli::Cli;
use fwgate_cli::exit::{exit_code, EXIT_SUCCESS};
use fwgate_cli::signal::Interrupts;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Ctrl-C stops a running watch; anywhere else it ends the command.
    let interrupts = Interrupts::new();
    let _listener = interrupts.listen();

    // Prompts block their thread, so the command runs on its own task.
    let mut command = tokio::spawn(fwgate_cli::run(cli, interrupts.clone()));

    let result = tokio::select! {
        joined = &mut command => match joined {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Command task failed: {}", e)),
        },
        _ = interrupts.exit_requested() => {
            command.abort();
            Err(fwgate_core::Error::Cancelled.into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            if code == EXIT_SUCCESS {
                warn!("Exiting...");
            } else {
                eprintln!("{} {:#}", "Error:".red().bold(), err);
            }
            ExitCode::from(code)
        }
    }
}
