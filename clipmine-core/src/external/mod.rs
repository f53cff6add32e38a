// ============================================================================
// clipmine-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg Binary
//
// This module encapsulates every interaction with the external transcoder.
// The pipeline only depends on two things from ffmpeg: exit status 0 meaning
// success, and the `Duration: HH:MM:SS.ff` diagnostic line when probing.
//
// KEY COMPONENTS:
// - FfmpegSpawner / FfmpegProcess traits and the ffmpeg-sidecar implementation
// - run_ffmpeg helper collecting diagnostic output
// - Dependency checking
// - MockFfmpegSpawner for tests (test builds or the "test-mocks" feature)
//
// AI-ASSISTANT-INFO: External tool abstractions and dependency checks for ffmpeg

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Scripted spawner used by tests
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{
    FfmpegProcess, FfmpegRun, FfmpegSpawner, SidecarProcess, SidecarSpawner, run_ffmpeg,
};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and discards its output.
///
/// # Arguments
///
/// * `cmd_name` - The name of the command to check (e.g., "ffmpeg")
///
/// # Returns
///
/// * `Ok(())` - If the command could be started
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}
