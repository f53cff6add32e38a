//! Core library for finding a character in long videos and cutting clips of
//! every appearance.
//!
//! The pipeline splits a source video into fixed-length parts, asks a hosted
//! multimodal model where the character appears in each part, stores the
//! answers as per-part metadata records, merges them into one timeline and
//! cuts the clips with ffmpeg.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use clipmine_core::analysis::GeminiClient;
//! use clipmine_core::config::{ApiConfig, CoreConfigBuilder};
//! use clipmine_core::external::SidecarSpawner;
//! use clipmine_core::notifications::NullNotificationSender;
//! use clipmine_core::{PipelineContext, process_videos};
//! use std::path::PathBuf;
//!
//! let config = CoreConfigBuilder::new()
//!     .character_image(PathBuf::from("reference.png"))
//!     .api(ApiConfig::new("api-key"))
//!     .build();
//! config.validate().unwrap();
//!
//! let client = GeminiClient::new(config.require_api().unwrap()).unwrap();
//! let spawner = SidecarSpawner;
//! let notifier = NullNotificationSender;
//! let ctx = PipelineContext::new(&spawner, &client, &config, &notifier);
//!
//! let summary = process_videos(&ctx, &[PathBuf::from("episode01.mp4")]).unwrap();
//! println!("{} parts analyzed", summary.parts_succeeded);
//! ```

pub mod analysis;
pub mod annotations;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod metadata;
pub mod naming;
pub mod notifications;
pub mod pause;
pub mod processing;
pub mod retry;
pub mod store;
pub mod terminal;
pub mod utils;

// Re-exports for public API
pub use config::{ApiConfig, CoreConfig, CoreConfigBuilder};
pub use discovery::{find_processable_files, resolve_inputs};
pub use error::{CoreError, CoreResult, ExtractionError};
pub use metadata::{AppearanceEvent, MergedTimeline, PartRecord};
pub use naming::PartId;
pub use notifications::{NotificationSender, NtfyNotificationSender};
pub use pause::PauseSignal;
pub use processing::{BatchSummary, PipelineContext, analyze_parts, process_videos};
pub use store::MetadataStore;
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
