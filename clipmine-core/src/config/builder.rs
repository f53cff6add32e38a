// ============================================================================
// clipmine-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every setting starts from the
// CoreConfig defaults, so a builder with no calls yields a usable
// configuration for the ffmpeg-only stages. Range checks live in
// CoreConfig::validate.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::{ApiConfig, CoreConfig};
use crate::analysis::PollSettings;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use clipmine_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .output_root(PathBuf::from("/data/outputs"))
///     .enable_compression(false)
///     .clip_buffer_secs(1.5)
///     .ntfy_topic("https://ntfy.sh/my-topic")
///     .build();
///
/// assert!(!config.enable_compression);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
    log_dir: Option<PathBuf>,
}

impl CoreConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the artifact root. The log directory follows it unless set
    /// explicitly.
    pub fn output_root(mut self, output_root: PathBuf) -> Self {
        self.config.output_root = output_root;
        self
    }

    pub fn log_dir(mut self, log_dir: PathBuf) -> Self {
        self.log_dir = Some(log_dir);
        self
    }

    pub fn segment_duration_secs(mut self, seconds: u32) -> Self {
        self.config.segment_duration_secs = seconds;
        self
    }

    pub fn enable_compression(mut self, enable: bool) -> Self {
        self.config.enable_compression = enable;
        self
    }

    pub fn target_size_mb(mut self, size_mb: f64) -> Self {
        self.config.target_size_mb = size_mb;
        self
    }

    pub fn remove_audio(mut self, remove: bool) -> Self {
        self.config.remove_audio = remove;
        self
    }

    pub fn clip_buffer_secs(mut self, seconds: f64) -> Self {
        self.config.clip_buffer_secs = seconds;
        self
    }

    pub fn character_image(mut self, path: PathBuf) -> Self {
        self.config.character_image = Some(path);
        self
    }

    pub fn character_prompt(mut self, prompt: &str) -> Self {
        self.config.character_prompt = prompt.to_string();
        self
    }

    pub fn video_prompt(mut self, prompt: &str) -> Self {
        self.config.video_prompt = prompt.to_string();
        self
    }

    pub fn poll_settings(mut self, poll: PollSettings) -> Self {
        self.config.poll = poll;
        self
    }

    pub fn delay_between_parts(mut self, delay: Duration) -> Self {
        self.config.delay_between_parts = delay;
        self
    }

    pub fn api(mut self, api: ApiConfig) -> Self {
        self.config.api = Some(api);
        self
    }

    pub fn ntfy_topic(mut self, topic: &str) -> Self {
        self.config.ntfy_topic = Some(topic.to_string());
        self
    }

    /// Builds the CoreConfig.
    pub fn build(self) -> CoreConfig {
        let mut config = self.config;
        config.log_dir = self
            .log_dir
            .unwrap_or_else(|| config.output_root.join("logs"));
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_defaults() {
        let config = CoreConfigBuilder::new().build();
        let defaults = CoreConfig::default();
        assert_eq!(config.output_root, defaults.output_root);
        assert_eq!(config.log_dir, defaults.log_dir);
        assert_eq!(config.segment_duration_secs, defaults.segment_duration_secs);
        assert!(config.api.is_none());
    }

    #[test]
    fn log_dir_follows_output_root_unless_set() {
        let config = CoreConfigBuilder::new()
            .output_root(PathBuf::from("/data/out"))
            .build();
        assert_eq!(config.log_dir, PathBuf::from("/data/out/logs"));

        let config = CoreConfigBuilder::new()
            .output_root(PathBuf::from("/data/out"))
            .log_dir(PathBuf::from("/var/log/clipmine"))
            .build();
        assert_eq!(config.log_dir, PathBuf::from("/var/log/clipmine"));
    }

    #[test]
    fn setters_override_defaults() {
        let config = CoreConfigBuilder::new()
            .segment_duration_secs(60)
            .enable_compression(false)
            .target_size_mb(20.0)
            .remove_audio(true)
            .clip_buffer_secs(0.5)
            .character_prompt("find her")
            .delay_between_parts(Duration::ZERO)
            .api(ApiConfig::new("key"))
            .ntfy_topic("https://ntfy.sh/clips")
            .build();

        assert_eq!(config.segment_duration_secs, 60);
        assert!(!config.enable_compression);
        assert_eq!(config.target_size_mb, 20.0);
        assert!(config.remove_audio);
        assert_eq!(config.clip_buffer_secs, 0.5);
        assert_eq!(config.character_prompt, "find her");
        assert_eq!(config.delay_between_parts, Duration::ZERO);
        assert_eq!(config.api.map(|a| a.api_key), Some("key".to_string()));
        assert_eq!(config.ntfy_topic.as_deref(), Some("https://ntfy.sh/clips"));
    }
}
