// ============================================================================
// clipmine-core/src/metadata/merge.rs
// ============================================================================
//
// METADATA MERGER: Part Records to Merged Timeline
//
// Reads a set of Part Metadata Records, orders them by part number and
// concatenates their durations and appearances into one MergedTimeline.
// Appearance entries are copied as they are, without validating their shape.
//
// ORDERING:
// Records are sorted by the part number parsed from each file stem. When any
// stem lacks a part number the whole set falls back to a lexicographic sort of
// the full paths and a warning is logged; in that mode `Part10` sorts before
// `Part2`.
//
// AI-ASSISTANT-INFO: Merge of per-part JSON records into a timestamped timeline

// ---- Internal crate imports ----
use super::{
    APPEARANCES_KEY, MergedTimeline, PartDuration, duration_from_value,
    duration_key_for,
};
use crate::error::{CoreError, CoreResult};
use crate::naming::{self, PartId};

// ---- External crate imports ----
use chrono::Local;
use serde_json::Value;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Merges the given part records into a single timeline.
///
/// # Arguments
///
/// * `paths` - Record files, in any order
///
/// # Returns
///
/// * `Ok(MergedTimeline)` - Durations summed, appearances concatenated in part order
/// * `Err(CoreError::Merge)` - If no paths were given or a record cannot be read
pub fn merge_part_files(paths: &[PathBuf]) -> CoreResult<MergedTimeline> {
    if paths.is_empty() {
        return Err(CoreError::Merge("no part metadata files given".to_string()));
    }

    let ordered = order_paths(paths);
    let mut timeline = MergedTimeline::default();

    for path in &ordered {
        let stem = file_stem(path)?;
        let value = read_json(path)?;
        let Value::Object(map) = value else {
            return Err(CoreError::Merge(format!(
                "{} is not a JSON object",
                path.display()
            )));
        };

        let duration = map
            .get(&duration_key_for(&stem))
            .map(duration_from_value)
            .unwrap_or(0);
        if duration == 0 {
            log::warn!("No duration recorded for {}, counting it as 0", stem);
        }

        timeline.total_duration_seconds += duration;
        timeline.part_durations.push(PartDuration {
            part: stem.clone(),
            time: duration,
        });

        match map.get(APPEARANCES_KEY) {
            Some(Value::Array(items)) => {
                timeline.appearances.extend(items.iter().cloned());
            }
            Some(Value::Null) | None => {}
            Some(_) => log::warn!(
                "{} field in {} is not a list, skipping it",
                APPEARANCES_KEY,
                path.display()
            ),
        }
    }

    log::debug!(
        "Merged {} parts: {} seconds, {} appearances",
        timeline.part_durations.len(),
        timeline.total_duration_seconds,
        timeline.appearances.len()
    );

    Ok(timeline)
}

/// Writes a timeline as `<base>_all_<YYYYmmdd_HHMMSS>.json` inside `dir`.
///
/// A numeric suffix is added if a file with that name already exists, so a
/// merge never overwrites an earlier one.
pub fn write_merged_timeline(
    timeline: &MergedTimeline,
    dir: &Path,
    base_name: &str,
) -> CoreResult<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = merged_file_path(dir, base_name, &stamp);

    fs::create_dir_all(dir)?;
    let text = serde_json::to_string_pretty(timeline)?;
    fs::write(&path, text)?;

    log::info!("Merged timeline written to {}", path.display());
    Ok(path)
}

/// Merges `paths` and writes the result next to the first input.
pub fn merge_and_write(paths: &[PathBuf]) -> CoreResult<(MergedTimeline, PathBuf)> {
    let timeline = merge_part_files(paths)?;

    let first = &paths[0];
    let dir = match first.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base_name = naming::base_name_of(first)?;

    let path = write_merged_timeline(&timeline, &dir, &base_name)?;
    Ok((timeline, path))
}

/// Sorts by part number, or lexicographically when any stem has none.
fn order_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let parsed: Option<Vec<(u32, &PathBuf)>> = paths
        .iter()
        .map(|path| {
            path.file_name()
                .and_then(|name| PartId::parse(&name.to_string_lossy()))
                .map(|id| (id.sequence, path))
        })
        .collect();

    match parsed {
        Some(mut numbered) => {
            numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            numbered.into_iter().map(|(_, path)| path.clone()).collect()
        }
        None => {
            log::warn!(
                "Could not read a part number from every file name; ordering {} records by path instead",
                paths.len()
            );
            let mut sorted = paths.to_vec();
            sorted.sort();
            sorted
        }
    }
}

fn merged_file_path(dir: &Path, base_name: &str, stamp: &str) -> PathBuf {
    let candidate = dir.join(format!("{base_name}_all_{stamp}.json"));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{base_name}_all_{stamp}_{n}.json")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn file_stem(path: &Path) -> CoreResult<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| CoreError::Merge(format!("no file stem in {}", path.display())))
}

fn read_json(path: &Path) -> CoreResult<Value> {
    let text = fs::read_to_string(path)
        .map_err(|e| CoreError::Merge(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| CoreError::Merge(format!("cannot parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_record(dir: &Path, stem: &str, duration: Value, clips: usize) -> PathBuf {
        let label = stem.split('_').next().unwrap_or("Part0");
        let appearances: Vec<Value> = (1..=clips)
            .map(|i| {
                json!({
                    "part": label,
                    "clip": format!("clip_{i}"),
                    "start": format!("0:{:02}", i),
                    "end": format!("0:{:02}", i + 1),
                    "description": format!("{stem} #{i}")
                })
            })
            .collect();
        let mut record = serde_json::Map::new();
        record.insert(format!("{stem}_time"), duration);
        record.insert("Appearances".to_string(), Value::Array(appearances));

        let path = dir.join(format!("{stem}.json"));
        fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();
        path
    }

    #[test]
    fn empty_input_is_a_merge_error() {
        let err = merge_part_files(&[]).unwrap_err();
        assert!(matches!(err, CoreError::Merge(_)));
    }

    #[test]
    fn sums_durations_in_part_order() {
        let dir = tempdir().unwrap();
        let p3 = write_record(dir.path(), "Part3_Show", json!("45"), 1);
        let p1 = write_record(dir.path(), "Part1_Show", json!("120"), 2);
        let p2 = write_record(dir.path(), "Part2_Show", json!(120), 0);

        let timeline = merge_part_files(&[p3, p1, p2]).unwrap();

        assert_eq!(timeline.total_duration_seconds, 285);
        let order: Vec<&str> = timeline
            .part_durations
            .iter()
            .map(|p| p.part.as_str())
            .collect();
        assert_eq!(order, ["Part1_Show", "Part2_Show", "Part3_Show"]);

        let labels: Vec<(&str, &str)> = timeline
            .appearances
            .iter()
            .map(|e| (e["part"].as_str().unwrap(), e["clip"].as_str().unwrap()))
            .collect();
        assert_eq!(
            labels,
            [("Part1", "clip_1"), ("Part1", "clip_2"), ("Part3", "clip_1")]
        );
    }

    #[test]
    fn appearances_are_copied_without_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Part1_Show.json");
        let events = json!([
            {"part": "Part1", "clip": "clip_1", "start": "0:01", "end": "0:02", "description": "ok"},
            {"clip": "clip_2", "start": "0:05", "end": "0:06"},
            {"part": "Part1", "clip": "clip_x", "start": "0:09", "end": "0:10", "note": "kept"}
        ]);
        let record = json!({"Part1_Show_time": "60", "Appearances": events.clone()});
        fs::write(&path, record.to_string()).unwrap();

        let timeline = merge_part_files(&[path]).unwrap();

        assert_eq!(timeline.appearances.len(), 3);
        assert_eq!(Value::Array(timeline.appearances), events);
    }

    #[test]
    fn numeric_sort_places_part10_after_part2() {
        let dir = tempdir().unwrap();
        let p10 = write_record(dir.path(), "Part10_Show", json!("10"), 0);
        let p2 = write_record(dir.path(), "Part2_Show", json!("2"), 0);

        let timeline = merge_part_files(&[p10, p2]).unwrap();
        assert_eq!(timeline.part_durations[0].part, "Part2_Show");
        assert_eq!(timeline.part_durations[1].part, "Part10_Show");
    }

    #[test]
    fn unparsable_stem_falls_back_to_lexicographic_order() {
        let dir = tempdir().unwrap();
        let p2 = write_record(dir.path(), "Part2_Show", json!("120"), 0);
        let p10 = write_record(dir.path(), "Part10_Show", json!("120"), 0);
        let extra = write_record(dir.path(), "bonus_Show", json!("45"), 0);

        let timeline = merge_part_files(&[p2, extra, p10]).unwrap();

        let order: Vec<&str> = timeline
            .part_durations
            .iter()
            .map(|p| p.part.as_str())
            .collect();
        assert_eq!(order, ["Part10_Show", "Part2_Show", "bonus_Show"]);
        assert_eq!(timeline.total_duration_seconds, 285);
    }

    #[test]
    fn missing_duration_counts_as_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Part1_Show.json");
        fs::write(&path, r#"{"Appearances": []}"#).unwrap();

        let timeline = merge_part_files(&[path]).unwrap();
        assert_eq!(timeline.total_duration_seconds, 0);
        assert_eq!(timeline.part_durations[0].time, 0);
    }

    #[test]
    fn unreadable_record_is_a_merge_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Part1_Show.json");
        fs::write(&path, "{ not json").unwrap();

        let err = merge_part_files(&[path]).unwrap_err();
        assert!(matches!(err, CoreError::Merge(_)));
    }

    #[test]
    fn merged_file_names_never_collide() {
        let dir = tempdir().unwrap();
        let first = merged_file_path(dir.path(), "Show", "20240101_120000");
        assert_eq!(first, dir.path().join("Show_all_20240101_120000.json"));

        fs::write(&first, "{}").unwrap();
        let second = merged_file_path(dir.path(), "Show", "20240101_120000");
        assert_eq!(second, dir.path().join("Show_all_20240101_120000_1.json"));
    }

    #[test]
    fn merge_and_write_places_timeline_next_to_first_input() {
        let dir = tempdir().unwrap();
        let p1 = write_record(dir.path(), "Part1_Show", json!("120"), 1);
        let p2 = write_record(dir.path(), "Part2_Show", json!("30"), 1);

        let (timeline, path) = merge_and_write(&[p1, p2]).unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Show_all_"));
        assert!(name.ends_with(".json"));

        let written: MergedTimeline =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, timeline);
        assert_eq!(written.total_duration_seconds, 150);
    }
}
