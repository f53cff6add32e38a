// ============================================================================
// clipmine-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses clipmine-core's error type so that every failure reaching
// `main` is a `CoreError`; this module adds context helpers for wrapping
// lower-level errors with what the command was doing.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: anyhow-style context on Result and Option
// - cli_error!: formatted OperationFailed errors
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use clipmine_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// ERROR CONVERSION UTILITIES
// ============================================================================

/// Extension trait for adding context to errors in the CLI.
///
/// Similar to anyhow's context methods but converts to CoreError.
pub trait CliErrorContext<T> {
    /// Add context to an error.
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", context, core_error))
        })
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

impl<T> CliErrorContext<T> for Option<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.ok_or_else(|| CoreError::OperationFailed(context.to_string()))
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| CoreError::OperationFailed(f().to_string()))
    }
}

/// Creates a CLI error with a formatted message.
#[macro_export]
macro_rules! cli_error {
    ($($arg:tt)*) => {
        ::clipmine_core::CoreError::OperationFailed(format!($($arg)*))
    };
}

/// Suggestion printed under a fatal error, when one helps.
pub fn suggestion_for(error: &CoreError) -> Option<&'static str> {
    match error {
        CoreError::Config(msg) if msg.contains("API key") => {
            Some("Pass --api-key or set GOOGLE_API_KEY (a .env file in the working directory works)")
        }
        CoreError::Config(msg) if msg.contains("image") => {
            Some("Pass --character-image or set CLIPMINE_CHARACTER_IMAGE")
        }
        CoreError::DependencyNotFound(_) => Some("Install ffmpeg and make sure it is on PATH"),
        CoreError::NoFilesFound => Some("Check that the inputs are video files (.mp4, .mkv, ...)"),
        _ => None,
    }
}
