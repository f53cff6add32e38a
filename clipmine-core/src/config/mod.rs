//! Configuration structures and constants for the clipmine-core library.
//!
//! This module provides the configuration for the pipeline: where artifacts
//! go, how parts are cut and compressed, what the analysis model is asked,
//! and how the analysis API is reached.

mod builder;

use std::path::PathBuf;
use std::time::Duration;

pub use builder::CoreConfigBuilder;

use crate::analysis::{DEFAULT_MODEL, PollSettings};
use crate::error::{CoreError, CoreResult};
use crate::processing::clips::DEFAULT_CLIP_BUFFER_SECS;
use crate::processing::segment::DEFAULT_SEGMENT_DURATION_SECS;
use crate::retry::RetryPolicy;
use crate::store::DEFAULT_OUTPUT_ROOT;

// Default constants

/// Default target size of a compressed upload in megabytes.
pub const DEFAULT_TARGET_SIZE_MB: f64 = 50.0;

/// Default pause between two parts of a batch, in seconds.
/// Keeps the request rate of back-to-back analyses under the API quota.
pub const DEFAULT_DELAY_BETWEEN_PARTS_SECS: u64 = 5;

/// Default first-round prompt sent together with the character reference image.
pub const DEFAULT_CHARACTER_PROMPT: &str = "This is the character to look for. \
Memorize their appearance carefully: the video analysis that follows is based on it.";

/// Default second-round prompt sent together with each part.
pub const DEFAULT_VIDEO_PROMPT: &str = r#"Analyze every second of this video and identify which characters appear on screen.
Find every time range in which the character from the reference image appears, and for each range describe their facial expression and actions as precisely as possible without skipping any second.
If the character appears for a continuous stretch, report it as one range.
Answer in JSON inside a ```json fenced block, following exactly this format:
{
    "Appearances": [
        {
            "clip": "clip_1",
            "start": "0:19",
            "end": "0:20",
            "description": "The character seen from behind, hair moving, walking calmly."
        },
        {
            "clip": "clip_2",
            "start": "0:20",
            "end": "0:25",
            "description": "Walking side by side with another character, calm expression, glancing up at the sky."
        }
    ]
}"#;

/// Connection settings of the hosted analysis model.
///
/// Passed explicitly to the client; nothing is read from or written to the
/// process environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API key sent with every request
    pub api_key: String,

    /// Optional HTTP(S) proxy for all API traffic, e.g. `http://127.0.0.1:7890`
    pub proxy_url: Option<String>,

    /// Model used for generation, e.g. `gemini-1.5-pro`
    pub model_name: String,

    /// Retry schedule for uploads and generation requests
    pub retry_policy: RetryPolicy,
}

impl ApiConfig {
    /// Settings for `api_key` with the default model and retry policy.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            proxy_url: None,
            model_name: DEFAULT_MODEL.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Main configuration structure for the clipmine-core library.
///
/// Created by the consumer of the library (e.g., clipmine-cli) and passed to
/// the pipeline entry points. Every field has a default; `api` is only
/// needed by the analysis stage.
///
/// # Examples
///
/// ```rust
/// use clipmine_core::config::{ApiConfig, CoreConfigBuilder};
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_root(PathBuf::from("outputs"))
///     .segment_duration_secs(120)
///     .target_size_mb(50.0)
///     .character_image(PathBuf::from("reference.png"))
///     .api(ApiConfig::new("key"))
///     .build();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // Directories
    /// Root of the per-video artifact tree
    pub output_root: PathBuf,

    /// Directory for run logs
    pub log_dir: PathBuf,

    // Splitting and compression
    /// Length of each part in seconds
    pub segment_duration_secs: u32,

    /// Whether parts are compressed before upload
    pub enable_compression: bool,

    /// Target size of a compressed upload in megabytes
    pub target_size_mb: f64,

    /// Drop the audio track from compressed uploads
    pub remove_audio: bool,

    // Clip extraction
    /// Seconds added before and after every extracted clip
    pub clip_buffer_secs: f64,

    // Analysis
    /// Reference image of the character to search for
    pub character_image: Option<PathBuf>,

    pub character_prompt: String,
    pub video_prompt: String,

    /// How uploaded videos are polled until usable
    pub poll: PollSettings,

    /// Pause between two parts of a batch
    pub delay_between_parts: Duration,

    /// API connection settings; required for analysis
    pub api: Option<ApiConfig>,

    // Notifications
    /// ntfy topic URL for batch notifications
    pub ntfy_topic: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            log_dir: PathBuf::from(DEFAULT_OUTPUT_ROOT).join("logs"),
            segment_duration_secs: DEFAULT_SEGMENT_DURATION_SECS,
            enable_compression: true,
            target_size_mb: DEFAULT_TARGET_SIZE_MB,
            remove_audio: false,
            clip_buffer_secs: DEFAULT_CLIP_BUFFER_SECS,
            character_image: None,
            character_prompt: DEFAULT_CHARACTER_PROMPT.to_string(),
            video_prompt: DEFAULT_VIDEO_PROMPT.to_string(),
            poll: PollSettings::default(),
            delay_between_parts: Duration::from_secs(DEFAULT_DELAY_BETWEEN_PARTS_SECS),
            api: None,
            ntfy_topic: None,
        }
    }
}

impl CoreConfig {
    /// Checks value ranges that would make a stage misbehave.
    pub fn validate(&self) -> CoreResult<()> {
        if self.segment_duration_secs == 0 {
            return Err(CoreError::Config(
                "segment duration must be at least 1 second".to_string(),
            ));
        }
        if !(self.target_size_mb.is_finite() && self.target_size_mb > 0.0) {
            return Err(CoreError::Config(format!(
                "target size must be a positive number of MB, got {}",
                self.target_size_mb
            )));
        }
        if !(self.clip_buffer_secs.is_finite() && self.clip_buffer_secs >= 0.0) {
            return Err(CoreError::Config(format!(
                "clip buffer must be zero or positive, got {}",
                self.clip_buffer_secs
            )));
        }
        if self.poll.interval.is_zero() && !self.poll.timeout.is_zero() {
            log::warn!("Poll interval is zero; processing state will be queried without pause");
        }
        if let Some(api) = &self.api {
            if api.retry_policy.max_attempts == 0 {
                return Err(CoreError::Config(
                    "retry attempts must be at least 1".to_string(),
                ));
            }
            if api.model_name.trim().is_empty() {
                return Err(CoreError::Config("model name is empty".to_string()));
            }
        }
        Ok(())
    }

    /// API settings for the analysis stage.
    ///
    /// Fails before any work starts when no usable key is configured.
    pub fn require_api(&self) -> CoreResult<&ApiConfig> {
        match &self.api {
            Some(api) if !api.api_key.trim().is_empty() => Ok(api),
            _ => Err(CoreError::Config(
                "an API key is required for analysis (set GOOGLE_API_KEY or --api-key)"
                    .to_string(),
            )),
        }
    }

    /// Reference image for the character round.
    pub fn require_character_image(&self) -> CoreResult<&PathBuf> {
        match &self.character_image {
            Some(path) if path.is_file() => Ok(path),
            Some(path) => Err(CoreError::Config(format!(
                "character image {} does not exist",
                path.display()
            ))),
            None => Err(CoreError::Config(
                "a character reference image is required for analysis".to_string(),
            )),
        }
    }
}
