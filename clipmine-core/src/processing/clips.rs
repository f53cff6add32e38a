// ============================================================================
// clipmine-core/src/processing/clips.rs
// ============================================================================
//
// CLIP EXTRACTOR: Cutting Appearance Windows out of a Video
//
// Each appearance event becomes one re-encoded clip covering its time range
// plus a buffer on both sides. Cut points are not guaranteed to fall on
// keyframes, so clips are always re-encoded with libx264/aac.
//
// Every clip is cut independently: a bad timestamp or a failed ffmpeg run is
// recorded in the ClipBatchReport and the batch moves on.
//
// KEY COMPONENTS:
// - to_seconds / clip_window: Timestamp parsing and window arithmetic
// - ClipRequest: One clip to cut, with its output name and time offset
// - clip_requests_for_part / clip_requests_for_merged: Request builders
// - extract_clips: Runs ffmpeg for every request and collects results
//
// AI-ASSISTANT-INFO: Appearance clip extraction with per-clip failure collection

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::metadata::{AppearanceEvent, MergedTimeline, PartDuration};
use crate::naming::PartId;

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;
use serde_json::Value;

// ---- Standard library imports ----
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default seconds added before and after each appearance.
pub const DEFAULT_CLIP_BUFFER_SECS: f64 = 2.0;

// ============================================================================
// TIME ARITHMETIC
// ============================================================================

/// Parses an `M:S` timestamp (fractional seconds allowed) into seconds.
///
/// `H:M:S` is accepted as well. A missing colon or an unparsable component
/// is a `CoreError::Timestamp`.
pub fn to_seconds(timestamp: &str) -> CoreResult<f64> {
    let invalid = |reason: &str| CoreError::Timestamp(timestamp.to_string(), reason.to_string());

    let fields: Vec<&str> = timestamp.trim().split(':').map(str::trim).collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        [_] => return Err(invalid("expected M:S")),
        _ => return Err(invalid("too many ':' separators")),
    };

    let hours: u32 = hours.parse().map_err(|_| invalid("hours are not a whole number"))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| invalid("minutes are not a whole number"))?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid("seconds are not a number"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid("seconds must be non-negative"));
    }

    Ok(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

/// Time range of one clip, in seconds of the source video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub duration: f64,
}

impl ClipWindow {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Window `[max(0, start - buffer), end + buffer)` for an appearance.
///
/// # Examples
///
/// ```rust
/// use clipmine_core::processing::clips::clip_window;
///
/// let window = clip_window("1:00", "1:05", 2.0).unwrap();
/// assert_eq!((window.start, window.end()), (58.0, 67.0));
/// ```
pub fn clip_window(start: &str, end: &str, buffer_secs: f64) -> CoreResult<ClipWindow> {
    shifted_clip_window(start, end, buffer_secs, 0.0)
}

fn shifted_clip_window(
    start: &str,
    end: &str,
    buffer_secs: f64,
    offset: f64,
) -> CoreResult<ClipWindow> {
    let start_secs = to_seconds(start)? + offset;
    let end_secs = to_seconds(end)? + offset;
    if end_secs < start_secs {
        return Err(CoreError::InvalidInput(format!(
            "appearance ends ({end}) before it starts ({start})"
        )));
    }

    let buffer = buffer_secs.max(0.0);
    let clip_start = (start_secs - buffer).max(0.0);
    let clip_end = end_secs + buffer;
    Ok(ClipWindow {
        start: clip_start,
        duration: clip_end - clip_start,
    })
}

// ============================================================================
// REQUESTS
// ============================================================================

/// One clip to cut from a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    /// Output file name, e.g. `Part3_clip_2.mp4`
    pub output_name: String,
    pub start: String,
    pub end: String,
    /// Seconds added to both timestamps (position of the part in the source)
    pub offset_seconds: f64,
    pub description: String,
}

/// Requests for the events of one part, cut from that part's video file.
///
/// Clips are numbered by their position in `events`.
pub fn clip_requests_for_part(events: &[AppearanceEvent], part_label: &str) -> Vec<ClipRequest> {
    events
        .iter()
        .zip(1u32..)
        .map(|(event, position)| ClipRequest {
            output_name: format!("{part_label}_clip_{position}.mp4"),
            start: event.start.clone(),
            end: event.end.clone(),
            offset_seconds: 0.0,
            description: event.description.clone(),
        })
        .collect()
}

/// Requests for a merged timeline, cut from the unsplit source video.
///
/// Each event is shifted by the summed durations of the parts before its own,
/// taken in part-number order whatever order `part_times` lists them in.
/// Entries without a part number come last, by name. Events whose part is not
/// listed, or that lack a part or timestamps, are skipped with a warning; an
/// unreadable clip identifier falls back to the event's position in its part.
pub fn clip_requests_for_merged(timeline: &MergedTimeline) -> Vec<ClipRequest> {
    let offsets = part_offsets(&timeline.part_durations);
    let mut seen_per_part: HashMap<String, u32> = HashMap::new();

    timeline
        .appearances
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let Some(event) = merged_event(value, &mut seen_per_part) else {
                log::warn!(
                    "Skipping appearance {}: it needs a part, a start and an end",
                    index + 1
                );
                return None;
            };
            let Some(offset) = offsets.get(&event.part_id) else {
                log::warn!(
                    "Skipping {} clip {}: part not present in the timeline's part_times",
                    event.part_id,
                    event.clip_index
                );
                return None;
            };
            Some(ClipRequest {
                output_name: format!("{}_clip_{}.mp4", event.part_id, event.clip_index),
                start: event.start,
                end: event.end,
                offset_seconds: *offset,
                description: event.description,
            })
        })
        .collect()
}

/// Start offset of every part label in the unsplit source.
fn part_offsets(part_durations: &[PartDuration]) -> HashMap<String, f64> {
    let mut ordered: Vec<(Option<PartId>, &PartDuration)> = part_durations
        .iter()
        .map(|entry| (PartId::parse(&entry.part), entry))
        .collect();
    ordered.sort_by(|(a_id, a), (b_id, b)| {
        let a_seq = a_id.as_ref().map_or(u32::MAX, |id| id.sequence);
        let b_seq = b_id.as_ref().map_or(u32::MAX, |id| id.sequence);
        a_seq.cmp(&b_seq).then_with(|| a.part.cmp(&b.part))
    });

    let mut offsets = HashMap::new();
    let mut elapsed = 0.0;
    for (id, entry) in ordered {
        let label = id
            .map(|id| id.label())
            .unwrap_or_else(|| entry.part.split('_').next().unwrap_or_default().to_string());
        offsets.entry(label).or_insert(elapsed);
        elapsed += entry.time as f64;
    }
    offsets
}

/// Reads one merged appearance; unreadable clip identifiers fall back to
/// the event's position within its part.
fn merged_event(value: &Value, seen_per_part: &mut HashMap<String, u32>) -> Option<AppearanceEvent> {
    let part = value.get("part").and_then(Value::as_str)?;
    let position = seen_per_part.entry(part.to_string()).or_insert(0);
    *position += 1;
    AppearanceEvent::from_loose_value(value, None, *position)
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// A clip that could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFailure {
    /// 1-based position of the request in the batch
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Result of a clip batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipBatchReport {
    pub created: Vec<PathBuf>,
    pub failures: Vec<ClipFailure>,
}

impl ClipBatchReport {
    pub fn attempted(&self) -> usize {
        self.created.len() + self.failures.len()
    }
}

/// Cuts every request out of `source` into `out_dir`.
///
/// Never fails mid-batch; per-clip errors are collected in the report.
pub fn extract_clips<S: FfmpegSpawner>(
    spawner: &S,
    source: &Path,
    requests: &[ClipRequest],
    buffer_secs: f64,
    out_dir: &Path,
) -> ClipBatchReport {
    let mut report = ClipBatchReport::default();
    if requests.is_empty() {
        log::info!("No appearances to extract from {}", source.display());
        return report;
    }

    if let Err(e) = fs::create_dir_all(out_dir) {
        for (i, request) in requests.iter().enumerate() {
            report.failures.push(ClipFailure {
                index: i + 1,
                name: request.output_name.clone(),
                error: format!("cannot create {}: {}", out_dir.display(), e),
            });
        }
        return report;
    }

    for (i, request) in requests.iter().enumerate() {
        let output = out_dir.join(&request.output_name);
        match extract_one(spawner, source, request, buffer_secs, &output) {
            Ok(()) => {
                log::info!("Clip {}/{} saved: {}", i + 1, requests.len(), output.display());
                report.created.push(output);
            }
            Err(e) => {
                log::error!(
                    "Clip {}/{} ({}) failed: {}",
                    i + 1,
                    requests.len(),
                    request.output_name,
                    e
                );
                report.failures.push(ClipFailure {
                    index: i + 1,
                    name: request.output_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Extracted {}/{} clips from {}",
        report.created.len(),
        report.attempted(),
        source.display()
    );
    report
}

fn extract_one<S: FfmpegSpawner>(
    spawner: &S,
    source: &Path,
    request: &ClipRequest,
    buffer_secs: f64,
    output: &Path,
) -> CoreResult<()> {
    let window = shifted_clip_window(
        &request.start,
        &request.end,
        buffer_secs,
        request.offset_seconds,
    )?;

    let mut cmd = FfmpegCommand::new();
    cmd.arg("-y");
    cmd.input(source.to_string_lossy().as_ref());
    cmd.arg("-ss");
    cmd.arg(format!("{:.3}", window.start));
    cmd.arg("-t");
    cmd.arg(format!("{:.3}", window.duration));
    cmd.args(["-c:v", "libx264", "-c:a", "aac"]);
    cmd.output(output.to_string_lossy().as_ref());

    let run = run_ffmpeg(spawner, cmd, "clip extraction")?;
    if !run.status.success() {
        return Err(crate::error::command_failed_error(
            "ffmpeg (clip)",
            run.status,
            run.error_tail(3),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockFfmpegSpawner;
    use serde_json::json;
    use tempfile::tempdir;

    fn event(part: &str, clip_index: u32, start: &str, end: &str) -> AppearanceEvent {
        AppearanceEvent {
            part_id: part.to_string(),
            clip_index,
            start: start.to_string(),
            end: end.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn parses_minute_second_timestamps() {
        assert_eq!(to_seconds("0:19").unwrap(), 19.0);
        assert_eq!(to_seconds("1:05").unwrap(), 65.0);
        assert_eq!(to_seconds("2:03.5").unwrap(), 123.5);
        assert_eq!(to_seconds("12:00").unwrap(), 720.0);
        assert_eq!(to_seconds("1:02:03").unwrap(), 3723.0);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for bad in ["19", "a:10", "1:xx", "", "1:2:3:4", "0:-4"] {
            let err = to_seconds(bad).unwrap_err();
            assert!(matches!(err, CoreError::Timestamp(ref t, _) if t == bad), "{bad}");
        }
    }

    #[test]
    fn window_adds_buffer_and_clamps_at_zero() {
        let w = clip_window("1:00", "1:05", 2.0).unwrap();
        assert_eq!((w.start, w.end(), w.duration), (58.0, 67.0, 9.0));

        let w = clip_window("0:00", "0:01", 2.0).unwrap();
        assert_eq!((w.start, w.end()), (0.0, 3.0));
    }

    #[test]
    fn window_rejects_reversed_range() {
        let err = clip_window("0:10", "0:05", 2.0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn part_requests_are_numbered_by_position() {
        let events = vec![event("Part2", 4, "0:01", "0:02"), event("Part2", 9, "0:10", "0:12")];
        let requests = clip_requests_for_part(&events, "Part2");
        let names: Vec<&str> = requests.iter().map(|r| r.output_name.as_str()).collect();
        assert_eq!(names, ["Part2_clip_1.mp4", "Part2_clip_2.mp4"]);
        assert!(requests.iter().all(|r| r.offset_seconds == 0.0));
    }

    #[test]
    fn merged_requests_are_shifted_by_preceding_parts() {
        let timeline = MergedTimeline {
            total_duration_seconds: 285,
            part_durations: vec![
                PartDuration { part: "Part1_Show".to_string(), time: 120 },
                PartDuration { part: "Part2_Show".to_string(), time: 120 },
                PartDuration { part: "Part3_Show".to_string(), time: 45 },
            ],
            appearances: vec![
                json!({"part": "Part1", "clip": "clip_1", "start": "0:05", "end": "0:06"}),
                json!({"part": "Part3", "clip": "clip_1", "start": "0:10", "end": "0:20"}),
                json!({"part": "Part7", "clip": "clip_1", "start": "0:10", "end": "0:20"}),
            ],
        };

        let requests = clip_requests_for_merged(&timeline);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].offset_seconds, 0.0);
        assert_eq!(requests[1].offset_seconds, 240.0);
        assert_eq!(requests[1].output_name, "Part3_clip_1.mp4");

        let w = shifted_clip_window(&requests[1].start, &requests[1].end, 2.0, requests[1].offset_seconds)
            .unwrap();
        assert_eq!((w.start, w.end()), (248.0, 262.0));
    }

    #[test]
    fn merged_offsets_follow_part_numbers_not_listing_order() {
        let mut part_durations: Vec<PartDuration> = (1..=11)
            .map(|n| PartDuration {
                part: format!("Part{n}_Show"),
                time: 10 * n,
            })
            .collect();
        part_durations.sort_by(|a, b| a.part.cmp(&b.part));
        assert_eq!(part_durations[0].part, "Part10_Show");

        let timeline = MergedTimeline {
            total_duration_seconds: part_durations.iter().map(|p| p.time).sum(),
            part_durations,
            appearances: vec![
                json!({"part": "Part2", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
                json!({"part": "Part10", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
                json!({"part": "Part11", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
            ],
        };

        let offsets: Vec<f64> = clip_requests_for_merged(&timeline)
            .iter()
            .map(|r| r.offset_seconds)
            .collect();
        assert_eq!(offsets, [10.0, 450.0, 550.0]);
    }

    #[test]
    fn unnumbered_parts_are_offset_after_numbered_ones() {
        let timeline = MergedTimeline {
            total_duration_seconds: 120,
            part_durations: vec![
                PartDuration { part: "bonus_Show".to_string(), time: 20 },
                PartDuration { part: "Part10_Show".to_string(), time: 30 },
                PartDuration { part: "Part1_Show".to_string(), time: 50 },
                PartDuration { part: "Part2_Show".to_string(), time: 40 },
            ],
            appearances: vec![
                json!({"part": "Part2", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
                json!({"part": "Part10", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
                json!({"part": "bonus", "clip": "clip_1", "start": "0:00", "end": "0:01"}),
            ],
        };

        let offsets: Vec<f64> = clip_requests_for_merged(&timeline)
            .iter()
            .map(|r| r.offset_seconds)
            .collect();
        assert_eq!(offsets, [50.0, 90.0, 120.0]);
    }

    #[test]
    fn loosely_shaped_merged_events_still_become_clips() {
        let timeline = MergedTimeline {
            total_duration_seconds: 60,
            part_durations: vec![PartDuration { part: "Part1_Show".to_string(), time: 60 }],
            appearances: vec![
                json!({"part": "Part1", "clip": 3, "start": "0:01", "end": "0:02"}),
                json!({"part": "Part1", "clip": "clip_x", "start": "0:05", "end": "0:06"}),
                json!({"clip": "clip_4", "start": "0:07", "end": "0:08"}),
            ],
        };

        let names: Vec<String> = clip_requests_for_merged(&timeline)
            .into_iter()
            .map(|r| r.output_name)
            .collect();
        assert_eq!(names, ["Part1_clip_3.mp4", "Part1_clip_2.mp4"]);
    }

    #[test]
    fn failures_are_collected_not_raised() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("extract");
        let spawner = MockFfmpegSpawner::new();
        spawner.add_success_expectation("Part1_clip_1.mp4", vec![], true);
        spawner.add_exit_error_expectation("Part1_clip_3.mp4", vec![], 1);

        let events = vec![
            event("Part1", 1, "1:00", "1:05"),
            event("Part1", 2, "bad", "1:05"),
            event("Part1", 3, "0:00", "0:01"),
        ];
        let requests = clip_requests_for_part(&events, "Part1");
        let report = extract_clips(&spawner, Path::new("Part1_Show.mp4"), &requests, 2.0, &out_dir);

        assert_eq!(report.created, vec![out_dir.join("Part1_clip_1.mp4")]);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].name, "Part1_clip_2.mp4");
        assert_eq!(report.failures[1].index, 3);
        assert_eq!(report.attempted(), 3);

        let calls = spawner.get_received_calls();
        assert_eq!(calls.len(), 2);
        let first = calls[0].join(" ");
        assert!(first.contains("-ss 58.000 -t 9.000 -c:v libx264 -c:a aac"));
        assert!(calls[1].join(" ").contains("-ss 0.000 -t 3.000"));
    }
}
