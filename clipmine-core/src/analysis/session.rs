// ============================================================================
// clipmine-core/src/analysis/session.rs
// ============================================================================
//
// CHAT SESSION: Multi-Turn Conversation With Retry
//
// The analysis of one part is a two-round conversation: the character
// reference image with its prompt, then the part video with the analysis
// prompt. The model answers the second round in the context of the first, so
// the whole history is sent each time. A turn pair is only appended once the
// model has answered; a failed round leaves the history untouched.
//
// AI-ASSISTANT-INFO: Conversation history and retried sends/uploads

// ---- Internal crate imports ----
use super::{
    AnalysisClient, ContentPart, Generation, Role, Turn, UploadedFile, classify_api_error,
    mime_type_for,
};
use crate::error::CoreResult;
use crate::retry::{RetryPolicy, retry};
use crate::utils::get_filename_safe;

// ---- Standard library imports ----
use std::path::Path;
use std::time::{Duration, Instant};

/// Answer of one round and the wall time it took, retries included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub generation: Generation,
    pub elapsed: Duration,
}

/// Turn history of one conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: Vec<Turn>,
    policy: RetryPolicy,
}

impl ChatSession {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            history: Vec::new(),
            policy,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Number of completed rounds.
    pub fn rounds(&self) -> usize {
        self.history.len() / 2
    }

    /// Sends `parts` as the next user turn and records the answer.
    pub fn send<C: AnalysisClient>(
        &mut self,
        client: &C,
        parts: Vec<ContentPart>,
        label: &str,
    ) -> CoreResult<RoundOutcome> {
        let mut request = self.history.clone();
        request.push(Turn {
            role: Role::User,
            parts,
        });

        let started = Instant::now();
        let generation = retry(&self.policy, label, classify_api_error, |attempt| {
            if attempt > 1 {
                log::info!("{}: attempt {}", label, attempt);
            }
            client.generate(&request)
        })?;
        let elapsed = started.elapsed();

        // The user turn is the last element of `request`.
        self.history = request;
        self.history.push(Turn {
            role: Role::Model,
            parts: vec![ContentPart::Text(generation.text.clone())],
        });

        Ok(RoundOutcome {
            generation,
            elapsed,
        })
    }
}

/// Uploads `path` under the retry policy.
pub fn upload_with_retry<C: AnalysisClient>(
    client: &C,
    policy: &RetryPolicy,
    path: &Path,
) -> CoreResult<UploadedFile> {
    let display_name = get_filename_safe(path)?;
    let mime_type = mime_type_for(path);
    let label = format!("Upload of {display_name}");

    log::info!("Uploading {} ({})", path.display(), mime_type);
    let file = retry(policy, &label, classify_api_error, |_| {
        client.upload(path, mime_type, &display_name)
    })?;
    log::debug!("Uploaded {} as {}", display_name, file.name);
    Ok(file)
}
