// ============================================================================
// clipmine-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Per-Run File Logging via fern
//
// Every command logs through the `log` facade. Console lines keep the
// terminal module's colors and get a colored tag for warnings and errors;
// the run's log file receives the same lines with a timestamp, the level and
// all ANSI escape codes stripped.
//
// AI-ASSISTANT-INFO: fern dispatch for console and file logging

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};

// ---- External crate imports ----
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("clipmine_run_{}.log", clipmine_cli::logging::get_timestamp());
/// assert!(log_filename.starts_with("clipmine_run_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for one run of `command`.
pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("clipmine_{}_{}.log", command, get_timestamp()))
}

/// Console line for `message`; Info lines are printed as they are.
fn console_line(level: Level, message: &str, color: bool) -> String {
    let tag = match level {
        Level::Info => return message.to_string(),
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    if !color {
        return format!("[{tag}] {message}");
    }
    match level {
        Level::Error => format!("[{}] {message}", tag.red().bold()),
        Level::Warn => format!("[{}] {message}", tag.yellow()),
        _ => format!("[{}] {message}", tag.dimmed()),
    }
}

/// File line for `message` with escapes removed.
fn file_line(timestamp: &str, level: Level, message: &str) -> String {
    let plain = strip_ansi_escapes::strip_str(message);
    format!("{timestamp} [{level}] {plain}")
}

/// Installs the global logger for this run and returns the log file path.
///
/// Dependencies that log on every request are capped at Warn.
pub fn setup_logging(log_dir: &Path, command: &str, level: LevelFilter) -> CliResult<PathBuf> {
    fs::create_dir_all(log_dir)
        .cli_with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_path = log_file_path(log_dir, command);
    let log_file = fern::log_file(&log_path)
        .cli_with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let color = std::env::var("NO_COLOR").is_err();
    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}",
                console_line(record.level(), &message.to_string(), color)
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            out.finish(format_args!(
                "{}",
                file_line(&timestamp, record.level(), &message.to_string())
            ))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .level_for("ureq", LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| crate::cli_error!("Failed to initialize logging: {}", e))?;

    Ok(log_path)
}
