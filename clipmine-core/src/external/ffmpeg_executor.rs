// ============================================================================
// clipmine-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes. Every transcoder call in the pipeline (probe, compress, segment,
// clip cut) goes through an `FfmpegSpawner`, so tests can substitute the mock
// spawner from `external::mocks`.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_ffmpeg: Spawn, drain events and wait, collecting the diagnostic text
//
// AI-ASSISTANT-INFO: FFmpeg process management and execution abstraction

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::process::ExitStatus;

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error(
                "ffmpeg (sidecar - get iter)",
                ExitStatus::default(),
                e.to_string(),
            )
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Run Helper ---

/// Outcome of a finished ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegRun {
    pub status: ExitStatus,
    /// Diagnostic lines in the order ffmpeg printed them
    pub log_lines: Vec<String>,
    /// Input durations parsed by ffmpeg-sidecar, in seconds
    pub parsed_durations: Vec<f64>,
}

impl FfmpegRun {
    /// Last error-looking lines, for failure messages.
    pub fn error_tail(&self, max_lines: usize) -> String {
        let errors: Vec<&str> = self
            .log_lines
            .iter()
            .map(String::as_str)
            .filter(|line| line.to_ascii_lowercase().contains("error"))
            .collect();
        let source = if errors.is_empty() {
            self.log_lines.iter().map(String::as_str).collect()
        } else {
            errors
        };
        let start = source.len().saturating_sub(max_lines);
        source[start..].join("\n")
    }
}

/// Spawns `cmd`, drains its events and waits for it to exit.
///
/// The exit status is returned as data; callers decide whether a non-zero
/// status is fatal.
pub fn run_ffmpeg<S: FfmpegSpawner>(
    spawner: &S,
    cmd: FfmpegCommand,
    label: &str,
) -> CoreResult<FfmpegRun> {
    log::debug!("Running {} command: {:?}", label, cmd);

    let mut process = spawner.spawn(cmd)?;
    let mut log_lines = Vec::new();
    let mut parsed_durations = Vec::new();

    process.handle_events(|event| {
        match event {
            FfmpegEvent::ParsedDuration(duration) => {
                parsed_durations.push(duration.duration);
                log_lines.push(duration.raw_log_message);
            }
            FfmpegEvent::Log(level, line) => {
                match level {
                    LogLevel::Error | LogLevel::Fatal => log::debug!(target: "ffmpeg_log", "{line}"),
                    _ => log::trace!(target: "ffmpeg_log", "{line}"),
                }
                log_lines.push(line);
            }
            FfmpegEvent::Error(line) => {
                log::debug!(target: "ffmpeg_log", "{line}");
                log_lines.push(line);
            }
            _ => {}
        }
        Ok(())
    })?;

    let status = process.wait()?;
    log::debug!("{} exited with {}", label, status);

    Ok(FfmpegRun {
        status,
        log_lines,
        parsed_durations,
    })
}
