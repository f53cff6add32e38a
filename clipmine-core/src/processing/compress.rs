// ============================================================================
// clipmine-core/src/processing/compress.rs
// ============================================================================
//
// COMPRESSOR: Size-Targeted Re-encoding
//
// Re-encodes a video with libx264 at a bitrate chosen so the output lands near
// a target file size. The bitrate is derived from the probed duration, so an
// unknown duration makes compression impossible and the call reports failure.
//
// BITRATE:
//   target_bits = target_size_mb * 8 * 1024 * 1024
//   video_bps   = target_bits / duration - audio_bps   (audio_bps = 128 kbps or 0)
//   clamped to a floor of 100 kbps
//
// AI-ASSISTANT-INFO: Target-size compression through ffmpeg

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::naming;
use crate::processing::probe::probe_duration;
use crate::utils::{calculate_size_reduction, format_bytes};

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Bits per second reserved for the AAC audio track.
pub const AUDIO_BITRATE_BPS: u64 = 128 * 1024;

/// Lowest video bitrate the compressor will request.
pub const MIN_VIDEO_BITRATE_BPS: u64 = 100 * 1024;

/// x264 speed/quality preset.
const X264_PRESET: &str = "medium";

/// Video bitrate in bits per second for the given target size.
///
/// Returns `MIN_VIDEO_BITRATE_BPS` (and logs a warning) when the computed
/// value falls below the floor. `duration_secs` must be positive.
pub fn calculate_video_bitrate(target_size_mb: f64, duration_secs: f64, remove_audio: bool) -> u64 {
    let target_bits = target_size_mb * 8.0 * 1024.0 * 1024.0;
    let audio_bps = if remove_audio { 0.0 } else { AUDIO_BITRATE_BPS as f64 };
    let raw = (target_bits / duration_secs - audio_bps).trunc();

    if !raw.is_finite() || raw < MIN_VIDEO_BITRATE_BPS as f64 {
        log::warn!(
            "Computed video bitrate {:.0} bps is below the {} bps floor; using the floor",
            raw,
            MIN_VIDEO_BITRATE_BPS
        );
        return MIN_VIDEO_BITRATE_BPS;
    }
    raw as u64
}

/// Compresses `input` to roughly `target_size_mb` megabytes at `output`.
///
/// # Arguments
///
/// * `spawner` - Spawner used for the probe and the encode
/// * `input` - Source video
/// * `output` - Destination file (overwritten)
/// * `target_size_mb` - Desired output size, must be positive
/// * `remove_audio` - Drop the audio track instead of encoding AAC
///
/// # Returns
///
/// * `Ok(true)` - ffmpeg exited with status 0
/// * `Ok(false)` - Missing input, unknown duration, or ffmpeg failure (logged)
/// * `Err(CoreError::InvalidInput)` - If `target_size_mb` is not positive
pub fn compress_video<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    output: &Path,
    target_size_mb: f64,
    remove_audio: bool,
) -> CoreResult<bool> {
    if !target_size_mb.is_finite() || target_size_mb <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "target size must be a positive number of megabytes, got {}",
            target_size_mb
        )));
    }

    if !input.is_file() {
        log::error!("Input file not found: {}", input.display());
        return Ok(false);
    }

    let duration = probe_duration(spawner, input);
    if duration <= 0.0 {
        log::error!(
            "Cannot compress {}: duration unknown",
            input.display()
        );
        return Ok(false);
    }

    let video_bps = calculate_video_bitrate(target_size_mb, duration, remove_audio);
    log::info!(
        "Compressing {} to ~{} MB (video {} kbps, audio {})",
        input.display(),
        target_size_mb,
        video_bps / 1024,
        if remove_audio { "removed" } else { "128k" }
    );

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut cmd = FfmpegCommand::new();
    cmd.input(input.to_string_lossy().as_ref());
    if remove_audio {
        cmd.arg("-an");
    }
    cmd.args(["-c:v", "libx264"]);
    cmd.arg("-b:v");
    cmd.arg(video_bps.to_string());
    cmd.args(["-preset", X264_PRESET]);
    cmd.arg("-y");
    if !remove_audio {
        cmd.args(["-c:a", "aac", "-b:a", "128k"]);
    }
    cmd.output(output.to_string_lossy().as_ref());

    let run = match run_ffmpeg(spawner, cmd, "compression") {
        Ok(run) => run,
        Err(e) => {
            log::error!("Compression of {} could not run: {}", input.display(), e);
            return Ok(false);
        }
    };

    if !run.status.success() {
        log::error!(
            "Compression of {} failed with {}: {}",
            input.display(),
            run.status,
            run.error_tail(3)
        );
        return Ok(false);
    }

    log::info!("Compressed {} -> {}", input.display(), output.display());
    Ok(true)
}

/// Compresses a part for upload into the video's `compressed` directory.
///
/// Writes `<compressed_dir>/<stem>_compressed.mp4`, logs the size reduction,
/// and returns the path to upload. Falls back to `input` when compression
/// fails for any reason.
pub fn compress_for_upload<S: FfmpegSpawner>(
    spawner: &S,
    input: &Path,
    compressed_dir: &Path,
    target_size_mb: f64,
    remove_audio: bool,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let output = compressed_dir.join(format!("{}.mp4", naming::compressed_stem(&stem)));

    match compress_video(spawner, input, &output, target_size_mb, remove_audio) {
        Ok(true) => {
            let original = fs::metadata(input).map(|m| m.len()).unwrap_or(0);
            let compressed = fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            log::info!(
                "Original size: {}, compressed size: {} ({}% smaller)",
                format_bytes(original),
                format_bytes(compressed),
                calculate_size_reduction(original, compressed)
            );
            output
        }
        Ok(false) => {
            log::warn!("Compression failed, uploading the original {}", input.display());
            input.to_path_buf()
        }
        Err(e) => {
            log::warn!(
                "Compression skipped ({}), uploading the original {}",
                e,
                input.display()
            );
            input.to_path_buf()
        }
    }
}
