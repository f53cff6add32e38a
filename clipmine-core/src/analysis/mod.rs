// ============================================================================
// clipmine-core/src/analysis/mod.rs
// ============================================================================
//
// ANALYSIS: Hosted Multimodal Model Access
//
// The pipeline asks a hosted model (Gemini) to find a character in each part.
// It only relies on three capabilities: uploading a media file and getting an
// opaque handle back, polling that handle's processing state, and generating
// a text response for a conversation. `AnalysisClient` captures exactly
// those, so the pipeline can run against a scripted client in tests.
//
// KEY COMPONENTS:
// - AnalysisClient: Upload / state / generate seam
// - GeminiClient: REST implementation over reqwest (gemini.rs)
// - ChatSession: Two-round conversation with retry (session.rs)
// - JobState polling for uploaded media (poll.rs)
// - Markdown analysis reports (report.rs)
//
// AI-ASSISTANT-INFO: Analysis API abstraction, shared request/response types

// ---- Submodules ----
pub mod gemini;
pub mod poll;
pub mod report;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// ---- Re-exports ----
pub use gemini::GeminiClient;
pub use poll::{JobState, PollSettings, ProcessingPoller};
pub use report::{AnalysisReport, image_link, write_analysis_report};
pub use session::{ChatSession, RoundOutcome, upload_with_retry};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::retry::{Disposition, RetryReason};

// ---- Standard library imports ----
use std::path::Path;

// ============================================================================
// MODELS
// ============================================================================

/// A model the analysis stage can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Models known to work with the two-round analysis.
pub const KNOWN_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "gemini-1.5-pro",
        description: "Pro - complex tasks",
    },
    ModelInfo {
        name: "gemini-1.5-flash",
        description: "Flash - general tasks",
    },
    ModelInfo {
        name: "gemini-2.0-flash-exp",
        description: "Experimental - new features",
    },
];

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Looks up a model in [`KNOWN_MODELS`].
pub fn known_model(name: &str) -> Option<&'static ModelInfo> {
    KNOWN_MODELS.iter().find(|m| m.name == name)
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Processing state of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Active,
    Failed,
    Unknown(String),
}

impl FileState {
    /// Maps the API's state names (`PROCESSING`, `ACTIVE`, `FAILED`).
    pub fn from_api(state: &str) -> Self {
        match state {
            "PROCESSING" => FileState::Processing,
            "ACTIVE" => FileState::Active,
            "FAILED" => FileState::Failed,
            other => FileState::Unknown(other.to_string()),
        }
    }
}

/// Handle of an uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Resource name used for state queries, e.g. `files/abc123`
    pub name: String,
    /// URI referenced from generation requests
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    File { mime_type: String, uri: String },
}

impl ContentPart {
    pub fn file(file: &UploadedFile) -> Self {
        ContentPart::File {
            mime_type: file.mime_type.clone(),
            uri: file.uri.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

/// Token counters reported with a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
}

/// Text answer plus usage of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

// ============================================================================
// CLIENT TRAIT
// ============================================================================

/// Operations the pipeline needs from the hosted model.
pub trait AnalysisClient {
    /// Uploads a local file and returns its handle.
    fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> CoreResult<UploadedFile>;

    /// Current processing state of an uploaded file.
    fn file_state(&self, name: &str) -> CoreResult<FileState>;

    /// Generates the next model turn for `history`.
    fn generate(&self, history: &[Turn]) -> CoreResult<Generation>;
}

/// Retry classification for errors returned by an `AnalysisClient`.
///
/// HTTP 429 is rate limiting, 5xx is a server error, other HTTP statuses are
/// fatal, and failures without a status (transport, I/O) are transient.
pub fn classify_api_error(err: &CoreError) -> Disposition {
    match err {
        CoreError::Api {
            status: Some(429), ..
        } => Disposition::Retry(RetryReason::RateLimited),
        CoreError::Api {
            status: Some(status),
            ..
        } if (500..600).contains(status) => Disposition::Retry(RetryReason::ServerError),
        CoreError::Api {
            status: Some(_), ..
        } => Disposition::Fatal,
        CoreError::Api { status: None, .. } | CoreError::Io(_) => {
            Disposition::Retry(RetryReason::Transient)
        }
        _ => Disposition::Fatal,
    }
}

/// MIME type sent with an upload, from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
