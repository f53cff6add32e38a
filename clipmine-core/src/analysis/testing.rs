// clipmine-core/src/analysis/testing.rs

// --- Scripted AnalysisClient (for unit tests) ---

use super::{AnalysisClient, FileState, Generation, TokenUsage, Turn, UploadedFile};
use crate::error::{CoreError, CoreResult};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Client answering from queues. Empty queues fall back to success for
/// uploads and state queries and to an error for generation.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    pub uploads: RefCell<VecDeque<CoreResult<UploadedFile>>>,
    pub states: RefCell<VecDeque<CoreResult<FileState>>>,
    pub generations: RefCell<VecDeque<CoreResult<Generation>>>,
    pub uploaded_paths: RefCell<Vec<PathBuf>>,
    pub histories: RefCell<Vec<Vec<Turn>>>,
}

pub(crate) fn uploaded(name: &str, mime_type: &str) -> UploadedFile {
    UploadedFile {
        name: format!("files/{name}"),
        uri: format!("https://example.invalid/v1beta/files/{name}"),
        mime_type: mime_type.to_string(),
        state: FileState::Processing,
    }
}

pub(crate) fn generation(text: &str, total_tokens: u64) -> Generation {
    Generation {
        text: text.to_string(),
        usage: TokenUsage {
            prompt_tokens: total_tokens / 2,
            response_tokens: total_tokens - total_tokens / 2,
            total_tokens,
        },
    }
}

impl ScriptedClient {
    pub fn push_generation(&self, result: CoreResult<Generation>) {
        self.generations.borrow_mut().push_back(result);
    }

    pub fn push_state(&self, result: CoreResult<FileState>) {
        self.states.borrow_mut().push_back(result);
    }

    pub fn push_upload(&self, result: CoreResult<UploadedFile>) {
        self.uploads.borrow_mut().push_back(result);
    }
}

impl AnalysisClient for ScriptedClient {
    fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> CoreResult<UploadedFile> {
        self.uploaded_paths.borrow_mut().push(path.to_path_buf());
        self.uploads
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(uploaded(display_name, mime_type)))
    }

    fn file_state(&self, _name: &str) -> CoreResult<FileState> {
        self.states
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(FileState::Active))
    }

    fn generate(&self, history: &[Turn]) -> CoreResult<Generation> {
        self.histories.borrow_mut().push(history.to_vec());
        self.generations.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(CoreError::OperationFailed(
                "no scripted generation left".to_string(),
            ))
        })
    }
}
