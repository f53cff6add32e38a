//! Video processing steps and their orchestration.
//!
//! Every step that runs ffmpeg lives here, next to the pipeline that chains
//! them for a batch.

/// Duration probing from ffmpeg diagnostics
pub mod probe;

/// Bitrate-targeted compression for upload
pub mod compress;

/// Fixed-length splitting into parts
pub mod segment;

/// Clip cutting from appearance timestamps
pub mod clips;

/// Batch orchestration
pub mod pipeline;

pub use clips::{ClipBatchReport, ClipRequest, extract_clips};
pub use compress::{compress_for_upload, compress_video};
pub use pipeline::{BatchSummary, PipelineContext, analyze_parts, process_videos};
pub use probe::probe_duration;
pub use segment::{SplitPart, split_video};
