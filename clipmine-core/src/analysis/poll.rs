// ============================================================================
// clipmine-core/src/analysis/poll.rs
// ============================================================================
//
// REMOTE PROCESSING POLL: Upload State Machine
//
// Uploaded videos are processed asynchronously by the API before they can be
// referenced in a prompt. The wait is modelled as a state machine:
//
//   Submitted -> Processing -> Ready
//                          \-> Failed(reason)
//                          \-> TimedOut       (deadline passed while processing)
//
// `poll` performs exactly one transition (one state query). Terminal states
// never change. `wait_until_settled` repeats `poll` with a fixed sleep.
//
// AI-ASSISTANT-INFO: Polling state machine for remote media processing

// ---- Internal crate imports ----
use super::{AnalysisClient, FileState, UploadedFile};
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;

/// State of a remote processing job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Processing,
    Ready,
    Failed(String),
    TimedOut,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed(_) | JobState::TimedOut)
    }
}

/// Interval between state queries and the overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }
}

/// Tracks one uploaded file until the API reports it usable.
pub struct ProcessingPoller<'a, C: AnalysisClient> {
    client: &'a C,
    file_name: String,
    settings: PollSettings,
    deadline: Instant,
    state: JobState,
}

impl<'a, C: AnalysisClient> ProcessingPoller<'a, C> {
    /// Starts tracking `file`; the deadline starts now.
    pub fn new(client: &'a C, file: &UploadedFile, settings: PollSettings) -> Self {
        Self {
            client,
            file_name: file.name.clone(),
            settings,
            deadline: Instant::now() + settings.timeout,
            state: JobState::Submitted,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Performs one transition.
    ///
    /// Query errors and unrecognized states count as still processing, so
    /// the deadline bounds them too.
    pub fn poll(&mut self) -> &JobState {
        if self.state.is_terminal() {
            return &self.state;
        }

        let next = match self.client.file_state(&self.file_name) {
            Ok(FileState::Active) => JobState::Ready,
            Ok(FileState::Failed) => {
                JobState::Failed(format!("{} reported state FAILED", self.file_name))
            }
            Ok(FileState::Processing) => JobState::Processing,
            Ok(FileState::Unknown(state)) => {
                log::debug!("{} is in state {}", self.file_name, state);
                JobState::Processing
            }
            Err(e) => {
                log::warn!("Could not query state of {}: {}", self.file_name, e);
                JobState::Processing
            }
        };

        self.state = if next == JobState::Processing && Instant::now() >= self.deadline {
            log::error!(
                "{} still processing after {}s",
                self.file_name,
                self.settings.timeout.as_secs()
            );
            JobState::TimedOut
        } else {
            next
        };
        &self.state
    }

    /// Polls until a terminal state, sleeping `interval` between queries.
    pub fn wait_until_settled(&mut self) -> JobState {
        loop {
            let state = self.poll().clone();
            if state.is_terminal() {
                return state;
            }
            log::info!("Waiting for {} to finish processing...", self.file_name);
            thread::sleep(self.settings.interval);
        }
    }
}

/// Converts a terminal state into a result for `file_name`.
pub fn settled_to_result(state: &JobState, file_name: &str) -> CoreResult<()> {
    match state {
        JobState::Ready => Ok(()),
        JobState::Failed(reason) => Err(CoreError::RemoteProcessing(
            file_name.to_string(),
            reason.clone(),
        )),
        JobState::TimedOut => Err(CoreError::Timeout(file_name.to_string())),
        JobState::Submitted | JobState::Processing => Err(CoreError::OperationFailed(format!(
            "{file_name} has not settled"
        ))),
    }
}
