// ============================================================================
// clipmine-core/src/processing/probe.rs
// ============================================================================
//
// DURATION PROBE: Media Length from ffmpeg Diagnostics
//
// Runs `ffmpeg -i <path>` and reads the `Duration: HH:MM:SS.ff` line from the
// diagnostic stream. The probe never fails: an unknown duration is reported as
// `0.0` and callers must treat it as unknown, not instant.
//
// AI-ASSISTANT-INFO: Duration probing through ffmpeg stderr parsing

// ---- Internal crate imports ----
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::utils::parse_ffmpeg_time;

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::path::Path;

/// Marker preceding the duration in ffmpeg's input summary.
const DURATION_MARKER: &str = "Duration:";

/// Returns the duration of `media_path` in seconds, or `0.0` when unknown.
///
/// # Arguments
///
/// * `spawner` - Spawner used to run ffmpeg
/// * `media_path` - File to probe
///
/// # Returns
///
/// Total seconds (`H*3600 + M*60 + S`). Spawn failures and missing duration
/// lines are logged and yield `0.0`.
pub fn probe_duration<S: FfmpegSpawner>(spawner: &S, media_path: &Path) -> f64 {
    let mut cmd = FfmpegCommand::new();
    cmd.input(media_path.to_string_lossy().as_ref());

    // Without an output ffmpeg exits non-zero after printing the input summary,
    // so only the diagnostic text matters here.
    let run = match run_ffmpeg(spawner, cmd, "duration probe") {
        Ok(run) => run,
        Err(e) => {
            log::error!("Failed to probe {}: {}", media_path.display(), e);
            return 0.0;
        }
    };

    let from_text = run.log_lines.iter().find_map(|line| parse_duration_line(line));
    match from_text.or_else(|| run.parsed_durations.first().copied()) {
        Some(seconds) => {
            log::debug!("Probed {}: {:.2}s", media_path.display(), seconds);
            seconds
        }
        None => {
            log::warn!("No duration found for {}", media_path.display());
            0.0
        }
    }
}

/// Probed duration truncated to whole seconds, as stored in part records.
pub fn probe_duration_secs<S: FfmpegSpawner>(spawner: &S, media_path: &Path) -> u64 {
    let seconds = probe_duration(spawner, media_path);
    if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    }
}

/// Parses one diagnostic line, e.g. `  Duration: 00:02:00.04, start: 0.000000`.
pub fn parse_duration_line(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once(DURATION_MARKER)?;
    let value = rest.trim_start().split([',', ' ']).next()?;
    parse_ffmpeg_time(value)
}

/// Scans a whole diagnostic text; `0.0` when no duration line is present.
pub fn parse_duration_output(output: &str) -> f64 {
    output
        .lines()
        .find_map(parse_duration_line)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::external::mocks::{MockFfmpegSpawner, duration_log_event};
    use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
    use std::path::PathBuf;

    #[test]
    fn parses_duration_lines() {
        assert_eq!(
            parse_duration_line("  Duration: 00:02:00.00, start: 0.000000, bitrate: 900 kb/s"),
            Some(120.0)
        );
        assert_eq!(parse_duration_line("Duration: 01:01:01.50"), Some(3661.5));
        assert_eq!(parse_duration_line("  Duration: N/A, bitrate: N/A"), None);
        assert_eq!(parse_duration_line("Stream #0:0: Video: h264"), None);
    }

    #[test]
    fn hundredths_are_fractional_seconds() {
        let seconds = parse_duration_line("Duration: 00:00:07.25,").unwrap();
        assert!((seconds - 7.25).abs() < 1e-9);
    }

    #[test]
    fn output_without_duration_is_zero() {
        let text = "Input #0, mov,mp4\n  Metadata:\n    major_brand: isom\n";
        assert_eq!(parse_duration_output(text), 0.0);

        let text = "Input #0\n  Duration: 00:04:05.00, start: 0\n  Duration: 00:00:01.00\n";
        assert_eq!(parse_duration_output(text), 245.0);
    }

    #[test]
    fn probe_reads_duration_from_log_events() {
        let spawner = MockFfmpegSpawner::new();
        spawner.add_probe_expectation("Part1_Show.mp4", 119.96);

        let seconds = probe_duration(&spawner, &PathBuf::from("/tmp/Part1_Show.mp4"));
        assert!((seconds - 119.96).abs() < 0.01);

        let calls = spawner.get_received_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&"-i".to_string()));
    }

    #[test]
    fn probe_without_duration_line_is_zero() {
        let spawner = MockFfmpegSpawner::new();
        spawner.add_exit_error_expectation(
            "broken.mp4",
            vec![FfmpegEvent::Log(
                LogLevel::Error,
                "broken.mp4: Invalid data found when processing input".to_string(),
            )],
            1,
        );
        assert_eq!(probe_duration(&spawner, Path::new("broken.mp4")), 0.0);
    }

    #[test]
    fn spawn_failure_is_zero() {
        let spawner = MockFfmpegSpawner::new();
        spawner.add_spawn_error_expectation(
            "missing.mp4",
            CoreError::DependencyNotFound("ffmpeg".to_string()),
        );
        assert_eq!(probe_duration(&spawner, Path::new("missing.mp4")), 0.0);
    }

    #[test]
    fn whole_seconds_are_truncated() {
        let spawner = MockFfmpegSpawner::new();
        spawner.add_success_expectation("a.mp4", vec![duration_log_event(45.9)], false);
        assert_eq!(probe_duration_secs(&spawner, Path::new("a.mp4")), 45);
    }
}
