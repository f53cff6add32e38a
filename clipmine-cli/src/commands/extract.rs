//! Implementation of the 'extract' subcommand.
//!
//! Accepts either a merged timeline (events are shifted by the durations of
//! the preceding parts and cut from the unsplit video) or a single part
//! record (events are cut from that part's video as they are).

use crate::cli::{Cli, ExtractArgs};
use crate::commands::report_counts;
use crate::error::{CliErrorContext, CliResult};

use clipmine_core::external::{SidecarSpawner, check_dependency};
use clipmine_core::naming::base_name_of;
use clipmine_core::processing::clips::{
    ClipRequest, clip_requests_for_merged, clip_requests_for_part,
};
use clipmine_core::processing::extract_clips;
use clipmine_core::{CoreError, MergedTimeline, MetadataStore, terminal};

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;

pub fn run_extract(cli: &Cli, args: ExtractArgs) -> CliResult<()> {
    check_dependency("ffmpeg")?;
    let started = Instant::now();
    if !args.buffer.is_finite() || args.buffer < 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "buffer must be zero or more seconds, got {}",
            args.buffer
        )));
    }
    if !args.video.is_file() {
        return Err(CoreError::PathError(format!(
            "{} does not exist",
            args.video.display()
        )));
    }

    let store = MetadataStore::new(&cli.output_root);
    let requests = load_requests(&store, &args.timeline)?;
    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => store.layout(&base_name_of(&args.video)?).extract,
    };

    terminal::print_section("Extract");
    terminal::print_status("Video", &args.video.display().to_string(), false);
    terminal::print_status("Timeline", &args.timeline.display().to_string(), false);
    terminal::print_status("Clips", &requests.len().to_string(), false);
    terminal::print_status("Buffer", &format!("{}s", args.buffer), false);
    terminal::print_status("Output", &out_dir.display().to_string(), false);

    let report = extract_clips(&SidecarSpawner, &args.video, &requests, args.buffer, &out_dir);
    for failure in &report.failures {
        terminal::print_warning(&format!(
            "Clip {} ({}) failed: {}",
            failure.index, failure.name, failure.error
        ));
    }

    report_counts(
        "clips",
        report.created.len(),
        report.failures.len(),
        started.elapsed(),
    )
}

/// Reads clip requests from a merged timeline or a part record.
fn load_requests(store: &MetadataStore, path: &Path) -> CliResult<Vec<ClipRequest>> {
    let text = fs::read_to_string(path)
        .cli_with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .cli_with_context(|| format!("Failed to parse {}", path.display()))?;

    if value.get("part_times").is_some() {
        let timeline: MergedTimeline = serde_json::from_value(value)
            .cli_with_context(|| format!("{} is not a merged timeline", path.display()))?;
        log::debug!(
            "{}: merged timeline with {} parts",
            path.display(),
            timeline.part_durations.len()
        );
        return Ok(clip_requests_for_merged(&timeline));
    }

    let record = store.read_record(path)?;
    log::debug!("{}: record of {}", path.display(), record.part);
    Ok(clip_requests_for_part(
        &record.appearances,
        &record.part.label(),
    ))
}
