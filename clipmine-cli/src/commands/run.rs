//! Implementation of the 'run' subcommand.
//!
//! The full pipeline: every input video is split, each part is analyzed and
//! cut, and the records of each video are merged into one timeline.

use crate::cli::{Cli, RunArgs};
use crate::commands::{analysis_config, print_analysis_settings, report_batch, spawn_pause_listener};
use crate::error::CliResult;

use clipmine_core::analysis::GeminiClient;
use clipmine_core::external::{SidecarSpawner, check_dependency};
use clipmine_core::notifications::sender_for_topic;
use clipmine_core::{PauseSignal, PipelineContext, process_videos, resolve_inputs, terminal};

use std::sync::Arc;

pub fn run_pipeline(cli: &Cli, args: RunArgs) -> CliResult<()> {
    let config = analysis_config(cli, &args.analysis, Some(args.segment_duration))?;
    check_dependency("ffmpeg")?;
    let inputs = resolve_inputs(&args.inputs)?;

    let client = GeminiClient::new(config.require_api()?)?;
    let notifier = sender_for_topic(config.ntfy_topic.as_deref());
    let spawner = SidecarSpawner;
    let pause = Arc::new(PauseSignal::new());
    spawn_pause_listener(Arc::clone(&pause));

    print_analysis_settings(&config, inputs.len());
    terminal::print_status(
        "Part length",
        &format!("{}s", config.segment_duration_secs),
        false,
    );

    let ctx = PipelineContext::new(&spawner, &client, &config, notifier.as_ref()).with_pause(&pause);
    let summary = match process_videos(&ctx, &inputs) {
        Ok(summary) => summary,
        Err(e) => {
            terminal::print_error("Batch aborted", &e.to_string(), None);
            return Err(e);
        }
    };
    report_batch(&summary)
}
