// ============================================================================
// clipmine-core/src/naming.rs
// ============================================================================
//
// NAMING CONVENTION: Part Identifiers and Base Name Recovery
//
// Every stage of the pipeline routes its outputs by the source video's base
// name, and every part file is named `Part<N>_<base_name>.<ext>`. An optional
// compression stage appends `_compressed` (older runs also produced
// `_compressedPart<N>`). This module is the only place where those names are
// parsed; everything downstream receives a `PartId` instead of re-deriving it.
//
// KEY COMPONENTS:
// - PartId: Typed identifier for one segment of a source video
// - strip_decorations: Base name recovery for any file stem
// - Helpers for the per-part file names used by the store and clip extractor
//
// AI-ASSISTANT-INFO: Part identifier type and file naming convention parser

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use once_cell::sync::Lazy;
use regex::Regex;

// ---- Standard library imports ----
use std::fmt;
use std::path::Path;

/// Leading `Part<N>_` prefix written by the segmenter.
static PART_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Part(\d+)_").expect("part prefix pattern is valid"));

/// `Part<N>` anywhere in a stem, used when the prefix is missing.
static PART_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Part(\d+)").expect("part search pattern is valid"));

/// Compression decoration and everything after it.
static COMPRESSED_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_compressed(?:Part\d+)?.*$").expect("suffix pattern is valid"));

/// Suffix appended by the compressor to a file stem.
pub const COMPRESSED_DECORATION: &str = "_compressed";

// ============================================================================
// PART IDENTIFIER
// ============================================================================

/// Identifies one segment of a source video.
///
/// Constructed once when the segmenter lists its output (or when a CLI
/// argument is parsed) and passed by value through the rest of the pipeline.
///
/// # Examples
///
/// ```rust
/// use clipmine_core::naming::PartId;
///
/// let id = PartId::parse("Part3_MyVideo_compressedPart3.mp4").unwrap();
/// assert_eq!(id.sequence, 3);
/// assert_eq!(id.base_name, "MyVideo");
/// assert_eq!(id.to_string(), "Part3_MyVideo");
/// assert_eq!(id.label(), "Part3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId {
    /// Stem of the source video shared by every part
    pub base_name: String,
    /// 1-based position of the part within the source video
    pub sequence: u32,
}

impl PartId {
    pub fn new(base_name: impl Into<String>, sequence: u32) -> Self {
        Self {
            base_name: base_name.into(),
            sequence,
        }
    }

    /// Parses a file name or stem following the `Part<N>_<base>` convention.
    ///
    /// A trailing extension is ignored, as are compression decorations.
    /// Returns `None` when no part number can be found or the base name would
    /// be empty.
    pub fn parse(name: &str) -> Option<Self> {
        let stem = strip_extension(name);

        let sequence = PART_PREFIX
            .captures(stem)
            .or_else(|| PART_ANYWHERE.captures(stem))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())?;

        let base_name = strip_decorations(stem);
        if base_name.is_empty() {
            return None;
        }

        Some(Self { base_name, sequence })
    }

    /// Parses the file name component of a path.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| CoreError::PathError(format!("No file name in {}", path.display())))?;

        Self::parse(&file_name).ok_or_else(|| {
            CoreError::Naming(format!(
                "cannot parse a part number from '{}' (expected Part<N>_<name>)",
                file_name
            ))
        })
    }

    /// Short label stored on appearance events, e.g. `Part3`.
    pub fn label(&self) -> String {
        format!("Part{}", self.sequence)
    }

    /// File name with the given extension, e.g. `Part3_MyVideo.json`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self, extension)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Part{}_{}", self.sequence, self.base_name)
    }
}

/// Recovers the part number from a `Part<N>` label stored on an event.
pub fn parse_part_label(label: &str) -> Option<u32> {
    label.strip_prefix("Part")?.parse().ok()
}

// ============================================================================
// BASE NAME RECOVERY
// ============================================================================

/// Strips the part prefix and compression suffix from a file stem.
///
/// Stems without decorations are returned unchanged, so this also yields the
/// base name of an unsplit source video.
pub fn strip_decorations(stem: &str) -> String {
    let without_prefix = PART_PREFIX.replace(stem, "");
    COMPRESSED_SUFFIX.replace(&without_prefix, "").into_owned()
}

/// Base name used to route outputs for any media path.
pub fn base_name_of(path: &Path) -> CoreResult<String> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| CoreError::PathError(format!("No file stem in {}", path.display())))?;

    let base = strip_decorations(&stem);
    if base.is_empty() {
        return Err(CoreError::Naming(format!(
            "'{}' has no base name after removing part decorations",
            stem
        )));
    }
    Ok(base)
}

/// File stem with the compression decoration appended.
pub fn compressed_stem(stem: &str) -> String {
    format!("{stem}{COMPRESSED_DECORATION}")
}

fn strip_extension(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|_| Path::new(name).extension().is_some_and(|ext| !ext.is_empty()))
        .unwrap_or(name)
}
