// clipmine-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and for downstream crates enabling "test-mocks".

use super::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::cell::RefCell;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::PathBuf;
use std::process::ExitStatus;
use std::rc::Rc;

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Rc<RefCell<Vec<FfmpegEvent>>>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let events = self.events_to_emit.borrow().clone();
        for event in events {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
    /// Files written for a `%d` output pattern, numbered from 1
    pub segment_count: u32,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn consumes the first expectation whose pattern is a substring of
/// any argument. Spawning with no matching expectation panics.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

/// Builds the stderr line ffmpeg prints for an input of `seconds` length.
pub fn duration_log_event(seconds: f64) -> FfmpegEvent {
    let whole = seconds.max(0.0);
    let hours = (whole / 3600.0).floor();
    let minutes = ((whole - hours * 3600.0) / 60.0).floor();
    let secs = whole - hours * 3600.0 - minutes * 60.0;
    FfmpegEvent::Log(
        LogLevel::Info,
        format!(
            "  Duration: {:02}:{:02}:{:05.2}, start: 0.000000, bitrate: 1200 kb/s",
            hours as u64, minutes as u64, secs
        ),
    )
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
            segment_count: 1,
        });
    }

    /// Expects a segmenting run that writes `count` numbered parts.
    pub fn add_segment_expectation(&self, arg_pattern: &str, count: u32) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(Vec::new())),
            exit_status: ExitStatus::from_raw(0),
        };
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result: Ok(process),
            create_dummy_output: true,
            segment_count: count,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: ExitStatus::from_raw(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    /// Expects a probe of a file whose name contains `arg_pattern`.
    pub fn add_probe_expectation(&self, arg_pattern: &str, seconds: f64) {
        // `ffmpeg -i` without an output exits 1 after printing the header.
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(vec![duration_log_event(seconds)])),
            exit_status: ExitStatus::from_raw(1 << 8),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            // Wait status encoding: the exit code lives in the high byte.
            exit_status: ExitStatus::from_raw(exit_code << 8),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn remaining_expectations(&self) -> usize {
        self.expectations.borrow().len()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner_mut()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        let mut expectations = self.expectations.borrow_mut();

        let found_index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        let Some(index) = found_index else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            panic!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
        };

        let expectation = expectations.remove(index);
        log::info!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        if expectation.result.is_ok() && expectation.create_dummy_output {
            if let Some(output_path_str) = args.last() {
                let outputs: Vec<PathBuf> = if output_path_str.contains("%d") {
                    (1..=expectation.segment_count)
                        .map(|n| PathBuf::from(output_path_str.replace("%d", &n.to_string())))
                        .collect()
                } else {
                    vec![PathBuf::from(output_path_str)]
                };
                for output_path in outputs {
                    if let Some(parent) = output_path.parent() {
                        if let Err(e) = std::fs::create_dir_all(parent) {
                            log::error!("MockFfmpegSpawner failed to create parent dir {:?}: {}", parent, e);
                        }
                    }
                    if let Err(e) = std::fs::write(&output_path, b"mock output") {
                        log::error!(
                            "MockFfmpegSpawner failed to create dummy output file {:?}: {}",
                            output_path,
                            e
                        );
                    }
                }
            }
        }

        expectation.result
    }
}
