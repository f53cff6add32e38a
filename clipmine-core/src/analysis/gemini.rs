// ============================================================================
// clipmine-core/src/analysis/gemini.rs
// ============================================================================
//
// GEMINI CLIENT: AnalysisClient over the Gemini REST API
//
// Blocking reqwest client for the three calls the pipeline needs:
// - resumable upload:  POST {base}/upload/v1beta/files
// - file state:        GET  {base}/v1beta/{name}
// - generation:        POST {base}/v1beta/models/{model}:generateContent
//
// The API key is sent as the `key` query parameter. A proxy, when configured,
// is applied to this client only; no process environment is modified.
//
// AI-ASSISTANT-INFO: Gemini REST client (upload, state, generateContent)

// ---- Internal crate imports ----
use super::{AnalysisClient, ContentPart, FileState, Generation, TokenUsage, Turn, UploadedFile};
use crate::config::ApiConfig;
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Uploads and generations on long videos can take minutes.
const REQUEST_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<WireContent<'a>>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text { text: &'a str },
    File { file_data: WireFileData<'a> },
}

#[derive(Debug, Serialize)]
struct WireFileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Gemini implementation of [`AnalysisClient`].
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Builds a client from explicit API settings.
    ///
    /// # Returns
    ///
    /// * `Err(CoreError::Config)` - If the key is empty or the proxy URL is invalid
    pub fn new(config: &ApiConfig) -> CoreResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::Config("API key is empty".to_string()));
        }

        let mut builder = Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| CoreError::Config(format!("invalid proxy URL '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
            log::debug!("Using proxy {}", proxy_url);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn start_upload(&self, byte_len: u64, mime_type: &str, display_name: &str) -> CoreResult<String> {
        let url = format!("{}/upload/v1beta/files", self.base_url);
        let body = serde_json::json!({ "file": { "display_name": display_name } });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", byte_len.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&body)
            .send()?;
        let response = check_status(response)?;

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| CoreError::Api {
                status: None,
                message: "upload session response has no x-goog-upload-url header".to_string(),
            })
    }
}

impl AnalysisClient for GeminiClient {
    fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> CoreResult<UploadedFile> {
        let bytes = fs::read(path)?;
        log::debug!(
            "Uploading {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            mime_type
        );

        let upload_url = self.start_upload(bytes.len() as u64, mime_type, display_name)?;

        let response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()?;
        let uploaded: UploadResponse = check_status(response)?.json()?;

        Ok(file_from_resource(uploaded.file, mime_type))
    }

    fn file_state(&self, name: &str) -> CoreResult<FileState> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()?;
        let resource: FileResource = check_status(response)?.json()?;
        Ok(resource
            .state
            .as_deref()
            .map(FileState::from_api)
            .unwrap_or(FileState::Unknown(String::new())))
    }

    fn generate(&self, history: &[Turn]) -> CoreResult<Generation> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = build_request(history);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()?;
        let parsed: GenerateResponse = check_status(response)?.json()?;
        generation_from_response(parsed)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_status(response: Response) -> CoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(CoreError::Api {
        status: Some(status.as_u16()),
        message: summarize_error_body(&body),
    })
}

/// Pulls `error.message` out of a JSON error body, or returns the raw text.
fn summarize_error_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn build_request(history: &[Turn]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: history
            .iter()
            .map(|turn| WireContent {
                role: turn.role.as_str(),
                parts: turn
                    .parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text(text) => WirePart::Text { text },
                        ContentPart::File { mime_type, uri } => WirePart::File {
                            file_data: WireFileData {
                                mime_type,
                                file_uri: uri,
                            },
                        },
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn generation_from_response(response: GenerateResponse) -> CoreResult<Generation> {
    let usage = response
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(CoreError::Api {
            status: None,
            message: format!("empty response: {}", reason),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(CoreError::Api {
            status: None,
            message: format!(
                "response has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(Generation { text, usage })
}

fn file_from_resource(resource: FileResource, requested_mime: &str) -> UploadedFile {
    UploadedFile {
        name: resource.name,
        uri: resource.uri,
        mime_type: resource
            .mime_type
            .unwrap_or_else(|| requested_mime.to_string()),
        state: resource
            .state
            .as_deref()
            .map(FileState::from_api)
            .unwrap_or(FileState::Processing),
    }
}
