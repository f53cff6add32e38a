//! Implementation of the 'merge' subcommand.
//!
//! Merges explicit part records, or every record of one video found under
//! the output root, into a `<base>_all_<timestamp>.json` timeline.

use crate::cli::{Cli, MergeArgs};
use crate::error::{CliErrorContext, CliResult};

use clipmine_core::metadata::merge_and_write;
use clipmine_core::processing::pipeline::merge_video_records;
use clipmine_core::{MergedTimeline, MetadataStore, terminal};

use std::fs;

pub fn run_merge(cli: &Cli, args: MergeArgs) -> CliResult<()> {
    terminal::print_section("Merge");

    let path = match &args.video {
        Some(base_name) => {
            let store = MetadataStore::new(&cli.output_root);
            terminal::print_status("Video", base_name, false);
            terminal::print_status(
                "Records",
                &store.layout(base_name).splitjson.display().to_string(),
                false,
            );
            merge_video_records(&store, base_name).cli_with_context(|| {
                format!(
                    "Nothing merged for {} under {}",
                    base_name,
                    cli.output_root.display()
                )
            })?
        }
        None => {
            terminal::print_status("Records", &args.records.len().to_string(), false);
            let (_, path) = merge_and_write(&args.records)?;
            path
        }
    };

    let text = fs::read_to_string(&path)
        .cli_with_context(|| format!("Failed to read back {}", path.display()))?;
    let timeline: MergedTimeline = serde_json::from_str(&text)
        .cli_with_context(|| format!("Failed to parse {}", path.display()))?;

    terminal::print_status("Parts", &timeline.part_durations.len().to_string(), false);
    terminal::print_status(
        "Total time",
        &clipmine_core::format_duration(timeline.total_duration_seconds as f64),
        false,
    );
    terminal::print_status("Appearances", &timeline.appearances.len().to_string(), true);
    terminal::print_success(&format!("Timeline written to {}", path.display()));
    Ok(())
}
