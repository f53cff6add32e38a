// ============================================================================
// clipmine-core/src/processing/segment.rs
// ============================================================================
//
// SEGMENTER: Fixed-Length Parts by Stream Copy
//
// Splits a source video into `Part<N>_<base>.mp4` files with ffmpeg's segment
// muxer (no re-encoding), then probes every part and writes an empty Part
// Metadata Record for it. The number of parts is whatever ffmpeg produced.
//
// Parts and records of the same base name left by an earlier split are
// deleted before ffmpeg runs.
//
// KNOWN LIMITATION:
// A failed ffmpeg run is a hard error for the whole video. Part files written
// before the failure are left in place.
//
// AI-ASSISTANT-INFO: Video segmentation and initial part record creation

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::metadata::PartRecord;
use crate::naming::{self, PartId};
use crate::processing::probe::probe_duration_secs;
use crate::store::{self, MetadataStore};

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Default part length in seconds.
pub const DEFAULT_SEGMENT_DURATION_SECS: u32 = 120;

/// One part produced by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    pub id: PartId,
    /// Video file in the `split` directory
    pub path: PathBuf,
    /// Probed duration; `0` when unknown
    pub duration_seconds: u64,
    /// Metadata record written for this part
    pub record_path: PathBuf,
}

/// Splits `input` into parts of `segment_duration_secs` seconds.
///
/// # Arguments
///
/// * `spawner` - Spawner used for the split and the per-part probes
/// * `store` - Store receiving the parts and their records
/// * `input` - Source video
/// * `segment_duration_secs` - Target part length, must be positive
///
/// # Returns
///
/// * `Ok(Vec<SplitPart>)` - Parts ordered by part number
/// * `Err(CoreError)` - Invalid arguments, ffmpeg failure, or I/O failure
pub fn split_video<S: FfmpegSpawner>(
    spawner: &S,
    store: &MetadataStore,
    input: &Path,
    segment_duration_secs: u32,
) -> CoreResult<Vec<SplitPart>> {
    if segment_duration_secs == 0 {
        return Err(CoreError::InvalidInput(
            "segment duration must be at least one second".to_string(),
        ));
    }
    if !input.is_file() {
        return Err(CoreError::PathError(format!(
            "Input video not found: {}",
            input.display()
        )));
    }

    let base_name = naming::base_name_of(input)?;
    let layout = store.ensure_layout(&base_name)?;
    let pattern = layout.split.join(format!("Part%d_{base_name}.mp4"));

    let removed = remove_earlier_parts(&layout.split, &layout.splitjson, &base_name)?;
    if removed > 0 {
        log::info!(
            "Removed {} part files and records left by an earlier split of {}",
            removed,
            base_name
        );
    }

    log::info!(
        "Splitting {} into {}s parts under {}",
        input.display(),
        segment_duration_secs,
        layout.split.display()
    );

    let mut cmd = FfmpegCommand::new();
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-map", "0:v:0", "-map", "0:a:0?"]);
    cmd.args(["-c:v", "copy", "-c:a", "copy"]);
    cmd.args(["-f", "segment"]);
    cmd.arg("-segment_time");
    cmd.arg(segment_duration_secs.to_string());
    cmd.args(["-segment_start_number", "1"]);
    cmd.args(["-reset_timestamps", "1"]);
    cmd.args(["-avoid_negative_ts", "make_zero"]);
    cmd.arg("-y");
    cmd.output(pattern.to_string_lossy().as_ref());

    let run = run_ffmpeg(spawner, cmd, "segmentation")?;
    if !run.status.success() {
        log::error!("Splitting {} failed with {}", input.display(), run.status);
        return Err(command_failed_error(
            "ffmpeg (segment)",
            run.status,
            run.error_tail(3),
        ));
    }

    let part_files = store::list_parts(&layout.split, &base_name, "mp4")?;
    if part_files.is_empty() {
        log::warn!("ffmpeg produced no parts for {}", input.display());
    }

    let mut parts = Vec::with_capacity(part_files.len());
    for path in part_files {
        let id = PartId::from_path(&path)?;
        let duration_seconds = probe_duration_secs(spawner, &path);
        let record_path = store.write_record(&PartRecord::new(id.clone(), duration_seconds))?;
        log::info!("Created {} ({}s)", id, duration_seconds);
        parts.push(SplitPart {
            id,
            path,
            duration_seconds,
            record_path,
        });
    }

    log::info!("Split {} into {} parts", base_name, parts.len());
    Ok(parts)
}

/// Deletes the parts and records of `base_name` so only this run's output is listed.
///
/// Records are rewritten empty for every new part anyway; records of parts
/// the new split no longer has would otherwise end up in the merge.
fn remove_earlier_parts(split_dir: &Path, records_dir: &Path, base_name: &str) -> CoreResult<usize> {
    let mut removed = 0;
    for (dir, extension) in [(split_dir, "mp4"), (records_dir, "json")] {
        if !dir.is_dir() {
            continue;
        }
        for path in store::list_parts(dir, base_name, extension)? {
            log::debug!("Removing {}", path.display());
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockFfmpegSpawner;
    use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
    use tempfile::tempdir;

    fn source(dir: &Path) -> PathBuf {
        let input = dir.join("Show.mp4");
        fs::write(&input, b"video").unwrap();
        input
    }

    #[test]
    fn zero_duration_is_rejected() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("outputs"));
        let spawner = MockFfmpegSpawner::new();
        let err = split_video(&spawner, &store, &source(dir.path()), 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn splits_probes_and_writes_records() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("outputs"));
        let split_dir = store.layout("Show").split;
        fs::create_dir_all(&split_dir).unwrap();
        for name in ["Part1_Other.mp4", "notes.txt"] {
            fs::write(split_dir.join(name), b"part").unwrap();
        }

        let spawner = MockFfmpegSpawner::new();
        spawner.add_segment_expectation("segment", 2);
        spawner.add_probe_expectation("Part1_Show.mp4", 120.0);
        spawner.add_probe_expectation("Part2_Show.mp4", 45.5);

        let parts = split_video(&spawner, &store, &source(dir.path()), 120).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].id, PartId::new("Show", 1));
        assert_eq!(parts[0].duration_seconds, 120);
        assert_eq!(parts[1].id, PartId::new("Show", 2));
        assert_eq!(parts[1].duration_seconds, 45);

        let record = store.read_record(&parts[1].record_path).unwrap();
        assert_eq!(record.duration_seconds, 45);
        assert!(record.appearances.is_empty());

        let split_cmd = spawner.get_received_calls()[0].join(" ");
        assert!(split_cmd.contains("-c:v copy -c:a copy -f segment -segment_time 120"));
        assert!(split_cmd.contains("-reset_timestamps 1 -avoid_negative_ts make_zero"));
        assert!(split_cmd.ends_with("Part%d_Show.mp4"));
        assert_eq!(spawner.remaining_expectations(), 0);
        assert!(split_dir.join("Part1_Other.mp4").exists());
        assert!(split_dir.join("notes.txt").exists());
    }

    #[test]
    fn parts_from_an_earlier_split_are_not_listed() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("outputs"));
        let layout = store.ensure_layout("Show").unwrap();
        fs::write(layout.split.join("Part9_Show.mp4"), b"old part").unwrap();
        store.write_record(&PartRecord::new(PartId::new("Show", 9), 120)).unwrap();

        let spawner = MockFfmpegSpawner::new();
        spawner.add_segment_expectation("segment", 1);
        spawner.add_probe_expectation("Part1_Show.mp4", 30.0);

        let parts = split_video(&spawner, &store, &source(dir.path()), 120).unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].id, PartId::new("Show", 1));
        assert!(!layout.split.join("Part9_Show.mp4").exists());
        assert_eq!(
            store.list_records("Show").unwrap(),
            vec![layout.splitjson.join("Part1_Show.json")]
        );
    }

    #[test]
    fn ffmpeg_failure_is_hard_error() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("outputs"));
        let spawner = MockFfmpegSpawner::new();
        spawner.add_exit_error_expectation(
            "segment",
            vec![FfmpegEvent::Log(LogLevel::Error, "Error writing trailer".to_string())],
            1,
        );

        let err = split_video(&spawner, &store, &source(dir.path()), 60).unwrap_err();
        match err {
            CoreError::CommandFailed { message, .. } => {
                assert!(message.contains("Error writing trailer"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
