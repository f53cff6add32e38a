//! Implementation of the 'split' subcommand.
//!
//! Splits one video into parts under `<output-root>/<base>/split` and writes
//! an empty record for each part.

use crate::cli::{Cli, SplitArgs};
use crate::error::CliResult;

use clipmine_core::external::{SidecarSpawner, check_dependency};
use clipmine_core::processing::split_video;
use clipmine_core::{MetadataStore, terminal};

use std::time::Instant;

pub fn run_split(cli: &Cli, args: SplitArgs) -> CliResult<()> {
    check_dependency("ffmpeg")?;
    let started = Instant::now();
    let store = MetadataStore::new(&cli.output_root);

    terminal::print_section("Split");
    terminal::print_status("Input", &args.file.display().to_string(), false);
    terminal::print_status("Part length", &format!("{}s", args.segment_duration), false);

    let parts = split_video(&SidecarSpawner, &store, &args.file, args.segment_duration)?;

    terminal::print_processing(&format!("{} part(s)", parts.len()));
    for part in &parts {
        let duration = if part.duration_seconds > 0 {
            format!("{}s", part.duration_seconds)
        } else {
            "unknown duration".to_string()
        };
        terminal::print_sub_item(&format!("{} ({})", part.path.display(), duration));
    }

    terminal::print_success(&format!(
        "Split into {} part(s) in {}",
        parts.len(),
        clipmine_core::format_duration(started.elapsed().as_secs_f64())
    ));
    Ok(())
}
