//! Implementation of the 'analyze' subcommand.
//!
//! Runs the two-round conversation on parts that were split earlier, then
//! writes their reports and records and cuts their clips. Part files must
//! follow the `Part<N>_<base>.mp4` naming; others fail individually.

use crate::cli::{AnalyzeArgs, Cli};
use crate::commands::{analysis_config, print_analysis_settings, report_batch, spawn_pause_listener};
use crate::error::CliResult;

use clipmine_core::analysis::GeminiClient;
use clipmine_core::external::{SidecarSpawner, check_dependency};
use clipmine_core::notifications::sender_for_topic;
use clipmine_core::{PauseSignal, PipelineContext, analyze_parts, resolve_inputs};

use std::sync::Arc;

pub fn run_analyze(cli: &Cli, args: AnalyzeArgs) -> CliResult<()> {
    let config = analysis_config(cli, &args.analysis, None)?;
    check_dependency("ffmpeg")?;
    let parts = resolve_inputs(&args.parts)?;

    let client = GeminiClient::new(config.require_api()?)?;
    let notifier = sender_for_topic(config.ntfy_topic.as_deref());
    let spawner = SidecarSpawner;
    let pause = Arc::new(PauseSignal::new());
    spawn_pause_listener(Arc::clone(&pause));

    print_analysis_settings(&config, parts.len());

    let ctx = PipelineContext::new(&spawner, &client, &config, notifier.as_ref()).with_pause(&pause);
    let summary = analyze_parts(&ctx, &parts)?;
    report_batch(&summary)
}
