// clipmine-core/tests/metadata_flow_tests.rs
//
// Record lifecycle across stages: an empty record from splitting, the
// analysis answer replacing its appearances, and the merge of all records
// of a video into one timeline that can be cut from the source.

use clipmine_core::annotations::extract_appearances;
use clipmine_core::metadata::{PartRecord, merge_and_write, normalize_appearances};
use clipmine_core::naming::PartId;
use clipmine_core::processing::clips::{clip_requests_for_merged, clip_window};
use clipmine_core::store::MetadataStore;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const PART2_ANSWER: &str = r#"The character appears twice.

```json
{
    "Appearances": [
        {
            "clip": "clip_7",
            "start": "0:19",
            "end": "0:20",
            "description": "Seen from behind, hair moving in the wind."
        },
        {
            "clip": "clip_9",
            "start": "1:02",
            "end": "1:10",
            "description": "Walks beside a companion and looks up...
        },
    ]
}
```
"#;

#[test]
fn test_records_flow_into_merged_timeline() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = MetadataStore::new(dir.path().join("outputs"));

    // Records as the segmenter leaves them.
    for (sequence, seconds) in [(1, 120), (2, 120), (10, 37)] {
        store.write_record(&PartRecord::new(PartId::new("Show", sequence), seconds))?;
    }

    // Part 2 gets the model's answer; the truncated description line is dropped.
    let raw = extract_appearances(PART2_ANSWER)?;
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[1].description, "");
    let events = normalize_appearances(raw, 2);
    let part2 = PartId::new("Show", 2);
    let record_path = store.replace_appearances(&part2, events, || {
        panic!("the record exists, nothing to probe")
    })?;

    let record = store.read_record(&record_path)?;
    assert_eq!(record.duration_seconds, 120);
    assert_eq!(record.appearances[0].clip_index, 1);
    assert_eq!(record.appearances[1].clip_index, 2);

    // On disk the duration key comes first and clips are labelled clip_N.
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&record_path)?)?;
    let keys: Vec<&String> = on_disk.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "Part2_Show_time");
    assert_eq!(on_disk["Part2_Show_time"], "120");
    assert_eq!(on_disk["Appearances"][1]["clip"], "clip_2");
    assert_eq!(on_disk["Appearances"][1]["part"], "Part2");

    // Merge orders Part10 after Part2.
    let records = store.list_records("Show")?;
    assert_eq!(records.len(), 3);
    let (timeline, merged_path) = merge_and_write(&records)?;
    assert_eq!(timeline.total_duration_seconds, 277);
    let order: Vec<&str> = timeline
        .part_durations
        .iter()
        .map(|p| p.part.as_str())
        .collect();
    assert_eq!(order, vec!["Part1_Show", "Part2_Show", "Part10_Show"]);
    assert_eq!(timeline.appearances.len(), 2);
    assert!(
        merged_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Show_all_")
    );

    // The merged file is not mistaken for a part record.
    assert_eq!(store.list_records("Show")?.len(), 3);

    // Merged events are shifted by the preceding part (120s).
    let requests = clip_requests_for_merged(&timeline);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].output_name, "Part2_clip_1.mp4");
    assert_eq!(requests[0].offset_seconds, 120.0);

    Ok(())
}

#[test]
fn test_clip_window_applies_buffer() {
    let window = clip_window("0:01", "0:05", 2.0).unwrap();
    assert_eq!(window.start, 0.0);
    assert_eq!(window.end(), 7.0);

    let window = clip_window("1:00:00", "1:00:10", 0.0).unwrap();
    assert_eq!(window.start, 3600.0);
    assert_eq!(window.duration, 10.0);

    assert!(clip_window("0:10", "0:05", 2.0).is_err());
    assert!(clip_window("ten", "0:05", 2.0).is_err());
}

#[test]
fn test_missing_record_is_created_with_probed_duration() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store = MetadataStore::new(dir.path().join("outputs"));
    let part = PartId::new("Show", 4);

    let path = store.replace_appearances(&part, Vec::new(), || 42)?;
    let record = store.read_record(&path)?;
    assert_eq!(record.duration_seconds, 42);
    assert!(record.appearances.is_empty());
    assert_eq!(path, store.layout("Show").splitjson.join("Part4_Show.json"));
    Ok(())
}
