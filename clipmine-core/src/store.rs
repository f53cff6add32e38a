// ============================================================================
// clipmine-core/src/store.rs
// ============================================================================
//
// METADATA STORE: Per-Video Directory Tree and Part Records
//
// All pipeline state lives under one output root, one directory per source
// video:
//
//   <root>/<base>/split       split video parts (Part<N>_<base>.mp4)
//   <root>/<base>/splitjson   part records and merged timelines
//   <root>/<base>/analysis    markdown analysis reports
//   <root>/<base>/compressed  compressed upload copies
//   <root>/<base>/extract     extracted clips
//
// The store is the only writer of part records. Records are UTF-8 JSON
// indented with four spaces.
//
// AI-ASSISTANT-INFO: Output directory layout and part record persistence

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::metadata::{AppearanceEvent, PartRecord};
use crate::naming::PartId;

// ---- External crate imports ----
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "outputs";

/// Directories of one source video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLayout {
    pub root: PathBuf,
    pub split: PathBuf,
    pub splitjson: PathBuf,
    pub analysis: PathBuf,
    pub compressed: PathBuf,
    pub extract: PathBuf,
}

impl VideoLayout {
    fn all(&self) -> [&Path; 5] {
        [
            &self.split,
            &self.splitjson,
            &self.analysis,
            &self.compressed,
            &self.extract,
        ]
    }
}

/// Owner of every part record and merged timeline below `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStore {
    root: PathBuf,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT)
    }
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory layout for a source video, without touching the file system.
    pub fn layout(&self, base_name: &str) -> VideoLayout {
        let root = self.root.join(base_name);
        VideoLayout {
            split: root.join("split"),
            splitjson: root.join("splitjson"),
            analysis: root.join("analysis"),
            compressed: root.join("compressed"),
            extract: root.join("extract"),
            root,
        }
    }

    /// Creates every directory of the layout.
    pub fn ensure_layout(&self, base_name: &str) -> CoreResult<VideoLayout> {
        let layout = self.layout(base_name);
        for dir in layout.all() {
            fs::create_dir_all(dir).map_err(|e| {
                CoreError::PathError(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(layout)
    }

    /// Location of the record for `part`.
    pub fn record_path(&self, part: &PartId) -> PathBuf {
        self.layout(&part.base_name)
            .splitjson
            .join(part.file_name("json"))
    }

    /// Writes `record` to its location, replacing any previous content.
    pub fn write_record(&self, record: &PartRecord) -> CoreResult<PathBuf> {
        let path = self.record_path(&record.part);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = to_indented_json(&record.to_json()?)?;
        fs::write(&path, text)?;
        log::debug!("Wrote metadata record {}", path.display());
        Ok(path)
    }

    /// Reads the record at `path`; the part is taken from the file name.
    pub fn read_record(&self, path: &Path) -> CoreResult<PartRecord> {
        let part = PartId::from_path(path)?;
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        PartRecord::from_json(part, value)
    }

    /// Replaces the appearance list of `part` wholesale.
    ///
    /// An existing record keeps its duration, its unknown keys and their
    /// order; its old events are discarded whatever their shape. A missing
    /// record is created, with its duration taken from `probe_duration`.
    pub fn replace_appearances<F>(
        &self,
        part: &PartId,
        events: Vec<AppearanceEvent>,
        probe_duration: F,
    ) -> CoreResult<PathBuf>
    where
        F: FnOnce() -> u64,
    {
        let path = self.record_path(part);
        let mut record = if path.exists() {
            self.read_record(&path)?
        } else {
            log::info!("No metadata record for {}, creating one", part);
            PartRecord::new(part.clone(), probe_duration())
        };

        record.appearances = events;
        self.write_record(&record)
    }

    /// Record files of `base_name`, ordered by part number.
    ///
    /// Merged timelines and unrelated files in the directory are ignored.
    pub fn list_records(&self, base_name: &str) -> CoreResult<Vec<PathBuf>> {
        let dir = self.layout(base_name).splitjson;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        list_parts(&dir, base_name, "json")
    }
}

/// Files in `dir` named exactly `Part<N>_<base_name>.<extension>`, by part number.
pub fn list_parts(dir: &Path, base_name: &str, extension: &str) -> CoreResult<Vec<PathBuf>> {
    let mut parts: Vec<(u32, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches_ext {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        if let Some(id) = PartId::parse(&stem) {
            if id.base_name == base_name && id.to_string() == stem {
                parts.push((id.sequence, path));
            }
        }
    }

    parts.sort_by_key(|(sequence, _)| *sequence);
    Ok(parts.into_iter().map(|(_, path)| path).collect())
}

/// Serializes with four-space indentation.
pub fn to_indented_json<T: Serialize>(value: &T) -> CoreResult<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| CoreError::OperationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(part: &str, clip_index: u32) -> AppearanceEvent {
        AppearanceEvent {
            part_id: part.to_string(),
            clip_index,
            start: "0:19".to_string(),
            end: "0:20".to_string(),
            description: "enters".to_string(),
        }
    }

    #[test]
    fn layout_uses_fixed_subdirectories() {
        let store = MetadataStore::new("/data/out");
        let layout = store.layout("Show");
        assert_eq!(layout.root, PathBuf::from("/data/out/Show"));
        assert_eq!(layout.split, PathBuf::from("/data/out/Show/split"));
        assert_eq!(layout.splitjson, PathBuf::from("/data/out/Show/splitjson"));
        assert_eq!(layout.analysis, PathBuf::from("/data/out/Show/analysis"));
        assert_eq!(layout.compressed, PathBuf::from("/data/out/Show/compressed"));
        assert_eq!(layout.extract, PathBuf::from("/data/out/Show/extract"));
        assert_eq!(
            store.record_path(&PartId::new("Show", 2)),
            PathBuf::from("/data/out/Show/splitjson/Part2_Show.json")
        );
        assert_eq!(MetadataStore::default().root(), Path::new("outputs"));
    }

    #[test]
    fn records_are_written_with_four_space_indent() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let path = store
            .write_record(&PartRecord::new(PartId::new("Show", 1), 120))
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\n    \"Part1_Show_time\": \"120\",\n    \"Appearances\": []\n}"
        );
    }

    #[test]
    fn replace_appearances_keeps_duration_and_extra_keys() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let part = PartId::new("Show", 3);
        let path = store.record_path(&part);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"Part3_Show_time": "45", "Appearances": [], "note": "keep me"}"#,
        )
        .unwrap();

        store
            .replace_appearances(&part, vec![event("Part3", 1)], || {
                panic!("existing record must not be probed")
            })
            .unwrap();

        let record = store.read_record(&path).unwrap();
        assert_eq!(record.duration_seconds, 45);
        assert_eq!(record.appearances, vec![event("Part3", 1)]);
        assert_eq!(record.extra["note"], "keep me");
    }

    #[test]
    fn replace_appearances_overwrites_events_missing_their_part() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let part = PartId::new("Show", 2);
        let path = store.record_path(&part);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"Part2_Show_time": "120", "Appearances": [{"clip": 1, "start": "00:00:01", "end": "00:00:02"}, {"clip": "clip_2"}]}"#,
        )
        .unwrap();

        store
            .replace_appearances(&part, vec![event("Part2", 1)], || 0)
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Part2_Show_time"], "120");
        assert_eq!(value["Appearances"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["Appearances"][0]["part"], "Part2");
    }

    #[test]
    fn replace_appearances_creates_missing_record() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let part = PartId::new("Show", 5);

        let path = store
            .replace_appearances(&part, vec![event("Part5", 1), event("Part5", 2)], || 97)
            .unwrap();

        let record = store.read_record(&path).unwrap();
        assert_eq!(record.duration_seconds, 97);
        assert_eq!(record.appearances.len(), 2);
    }

    #[test]
    fn replace_is_wholesale_not_append() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let part = PartId::new("Show", 1);
        store.write_record(&PartRecord::new(part.clone(), 120)).unwrap();

        store
            .replace_appearances(&part, vec![event("Part1", 1), event("Part1", 2)], || 0)
            .unwrap();
        let path = store
            .replace_appearances(&part, vec![event("Part1", 1)], || 0)
            .unwrap();

        assert_eq!(store.read_record(&path).unwrap().appearances.len(), 1);
    }

    #[test]
    fn list_records_orders_numerically_and_skips_merged_files() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        for n in [10, 2, 1] {
            store
                .write_record(&PartRecord::new(PartId::new("Show", n), 120))
                .unwrap();
        }
        store
            .write_record(&PartRecord::new(PartId::new("Other", 4), 120))
            .unwrap();
        let splitjson = store.layout("Show").splitjson;
        fs::write(splitjson.join("Show_all_20240101_000000.json"), "{}").unwrap();
        fs::write(splitjson.join("notes.txt"), "").unwrap();

        let names: Vec<String> = store
            .list_records("Show")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["Part1_Show.json", "Part2_Show.json", "Part10_Show.json"]);

        assert!(store.list_records("Missing").unwrap().is_empty());
    }

    #[test]
    fn ensure_layout_creates_directories() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        let layout = store.ensure_layout("Show").unwrap();
        assert!(layout.split.is_dir());
        assert!(layout.extract.is_dir());
    }
}
