//! Main entry point for the clipmine CLI application.
//!
//! Parses the command line, sets up console and file logging for the run,
//! dispatches to the command and maps the outcome to the exit code.

use clipmine_cli::error::suggestion_for;
use clipmine_cli::logging::setup_logging;
use clipmine_cli::{dispatch, parse_cli};
use clipmine_core::terminal;

use log::LevelFilter;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = parse_cli();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_dir = cli.effective_log_dir();
    let command = cli.command.name();
    match setup_logging(&log_dir, command, log_level) {
        Ok(path) => {
            log::debug!("Log file: {}", path.display());
            log::debug!("Run started: {}", chrono::Local::now());
        }
        Err(e) => eprintln!("Warning: file logging disabled: {e}"),
    }

    let started = Instant::now();
    let result = dispatch(cli);
    log::debug!(
        "{} finished after {:.1}s",
        command,
        started.elapsed().as_secs_f64()
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            terminal::print_error("clipmine failed", &e.to_string(), suggestion_for(&e));
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
