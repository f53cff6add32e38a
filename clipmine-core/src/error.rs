// ============================================================================
// clipmine-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types and Constructors
//
// This module defines the error taxonomy of the clipmine-core library. Each
// pipeline stage maps its failures onto one of these variants so callers can
// decide whether a failure is fatal for the batch, fatal for a single unit of
// work, or merely degraded data.
//
// KEY COMPONENTS:
// - CoreError: Main error enum for the library
// - ExtractionError: Failures recovering JSON from a model response
// - CoreResult: Result alias used throughout the crate
// - Helper constructors for external command failures
//
// AI-ASSISTANT-INFO: Error types and helper constructors for clipmine-core

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::process::ExitStatus;

// ============================================================================
// EXTRACTION ERRORS
// ============================================================================

/// Failures while recovering structured annotations from free text.
///
/// Extraction is best-effort: every variant is recoverable and callers log it
/// and mark the current part as failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON block found")]
    NoJsonBlock,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("missing Appearances field")]
    MissingAppearances,

    #[error("invalid appearance at index {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },
}

// ============================================================================
// CORE ERRORS
// ============================================================================

/// Main error type for clipmine-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, std::io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, std::io::Error),

    #[error("Command '{command}' failed with status {status}: {message}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        message: String,
    },

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("No processable video files found")]
    NoFilesFound,

    #[error("Naming convention violation: {0}")]
    Naming(String),

    #[error("Invalid timestamp '{0}': {1}")]
    Timestamp(String, String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Merge error: {0}")]
    Merge(String),

    #[error("Analysis API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api { status: Option<u16>, message: String },

    #[error("Remote processing of '{0}' failed: {1}")]
    RemoteProcessing(String, String),

    #[error("Timed out waiting for '{0}'")]
    Timeout(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for clipmine-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Api {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// HELPER CONSTRUCTORS
// ============================================================================

/// Builds the error for a command that could not be spawned.
pub fn command_start_error(command: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), err)
}

/// Builds the error for a command whose exit status could not be collected.
pub fn command_wait_error(command: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), err)
}

/// Builds the error for a command that exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    message: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        status,
        message: message.into(),
    }
}
