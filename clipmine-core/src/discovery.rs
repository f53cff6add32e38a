//! File discovery module for finding video files to process.
//!
//! Inputs may be given as files or directories. Directories are scanned at
//! the top level only, for files with a known video extension.

use crate::error::{CoreError, CoreResult};
use crate::utils::{has_video_extension, is_valid_video_file};

use std::path::{Path, PathBuf};

/// Finds video files in the top level of `input_dir`, sorted by path.
///
/// # Returns
///
/// * `Err(CoreError::Io)` - If the directory cannot be read
/// * `Err(CoreError::NoFilesFound)` - If no video files are found
///
/// # Examples
///
/// ```rust,no_run
/// use clipmine_core::find_processable_files;
/// use std::path::Path;
///
/// let files = find_processable_files(Path::new("/path/to/videos")).unwrap();
/// for file in files {
///     println!("{}", file.display());
/// }
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file() && has_video_extension(&path)).then_some(path)
        })
        .collect();

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        files.sort();
        Ok(files)
    }
}

/// Expands files and directories into the list of videos to process.
///
/// Explicit files must exist and carry a video extension; directories
/// without videos are skipped with a warning. Duplicates are dropped while
/// keeping the first occurrence.
pub fn resolve_inputs(inputs: &[PathBuf]) -> CoreResult<Vec<PathBuf>> {
    let mut resolved: Vec<PathBuf> = Vec::new();

    for input in inputs {
        if input.is_dir() {
            match find_processable_files(input) {
                Ok(files) => resolved.extend(files),
                Err(CoreError::NoFilesFound) => {
                    log::warn!("No video files found in {}", input.display());
                }
                Err(e) => return Err(e),
            }
        } else if is_valid_video_file(input) {
            resolved.push(input.clone());
        } else if input.exists() {
            return Err(CoreError::InvalidInput(format!(
                "{} is not a supported video file",
                input.display()
            )));
        } else {
            return Err(CoreError::PathError(format!(
                "{} does not exist",
                input.display()
            )));
        }
    }

    let mut seen = std::collections::HashSet::new();
    resolved.retain(|p| seen.insert(p.clone()));

    if resolved.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(resolved)
    }
}
