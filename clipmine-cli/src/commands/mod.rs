//! Command implementations for the CLI.
//!
//! Each submodule implements one subcommand. Helpers shared by the analysis
//! commands (configuration from arguments, the pause listener, the batch
//! summary) live here.

pub mod analyze;
pub mod compress;
pub mod extract;
pub mod merge;
pub mod probe;
pub mod run;
pub mod split;

use crate::cli::{AnalysisArgs, Cli};
use crate::error::{CliErrorContext, CliResult};

use clipmine_core::config::{
    ApiConfig, CoreConfig, CoreConfigBuilder, DEFAULT_CHARACTER_PROMPT, DEFAULT_VIDEO_PROMPT,
};
use clipmine_core::pause::PauseSignal;
use clipmine_core::retry::RetryPolicy;
use clipmine_core::{BatchSummary, terminal};

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Builds and validates the configuration of an analysis command.
///
/// Fails with a configuration error before any work when the API key or the
/// character image is missing.
pub fn analysis_config(
    cli: &Cli,
    args: &AnalysisArgs,
    segment_duration_secs: Option<u32>,
) -> CliResult<CoreConfig> {
    let mut api = ApiConfig::new(args.api_key.clone().unwrap_or_default());
    api.proxy_url = args.proxy.clone().filter(|p| !p.trim().is_empty());
    api.model_name = args.model.clone();
    api.retry_policy = RetryPolicy {
        max_attempts: args.max_retries,
        ..RetryPolicy::default()
    };

    let mut builder = CoreConfigBuilder::new()
        .output_root(cli.output_root.clone())
        .log_dir(cli.effective_log_dir())
        .enable_compression(!args.no_compress)
        .target_size_mb(args.compression.target_size_mb)
        .remove_audio(args.compression.remove_audio)
        .clip_buffer_secs(args.buffer)
        .character_prompt(&read_prompt(args.character_prompt.as_deref(), DEFAULT_CHARACTER_PROMPT)?)
        .video_prompt(&read_prompt(args.video_prompt.as_deref(), DEFAULT_VIDEO_PROMPT)?)
        .api(api);

    if let Some(seconds) = segment_duration_secs {
        builder = builder.segment_duration_secs(seconds);
    }
    if let Some(image) = &args.character_image {
        builder = builder.character_image(image.clone());
    }
    if let Some(delay) = args.delay {
        builder = builder.delay_between_parts(Duration::from_secs(delay));
    }
    if let Some(topic) = &args.ntfy {
        builder = builder.ntfy_topic(topic);
    }

    let config = builder.build();
    config.require_api()?;
    config.validate()?;
    config.require_character_image()?;
    Ok(config)
}

fn read_prompt(path: Option<&Path>, default: &str) -> CliResult<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .cli_with_context(|| format!("Failed to read prompt file {}", path.display())),
        None => Ok(default.to_string()),
    }
}

/// Starts a thread applying `pause` / `continue` lines from stdin.
///
/// The thread ends with stdin; it is never joined.
pub fn spawn_pause_listener(pause: Arc<PauseSignal>) {
    let spawned = thread::Builder::new()
        .name("pause-listener".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = line.trim();
                if !command.is_empty() && !pause.apply_command(command) {
                    log::warn!("Unknown command '{}'; type 'pause' or 'continue'", command);
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Pause commands unavailable: {}", e);
    }
}

/// Prints the settings an analysis run will use.
pub fn print_analysis_settings(config: &CoreConfig, inputs: usize) {
    terminal::print_section("Initialization");
    terminal::print_status("Inputs", &inputs.to_string(), false);
    terminal::print_status("Output root", &config.output_root.display().to_string(), false);
    if let Some(image) = &config.character_image {
        terminal::print_status("Character", &image.display().to_string(), false);
    }
    if let Some(api) = &config.api {
        terminal::print_status("Model", &api.model_name, true);
        if let Some(proxy) = &api.proxy_url {
            terminal::print_status("Proxy", proxy, false);
        }
    }
    let compression = if config.enable_compression {
        format!("{} MB", config.target_size_mb)
    } else {
        "off".to_string()
    };
    terminal::print_status("Compression", &compression, false);
    terminal::print_status("Clip buffer", &format!("{}s", config.clip_buffer_secs), false);
    if config.ntfy_topic.is_some() {
        terminal::print_status("Notifications", "ntfy", false);
    }
    terminal::print_sub_item("Type 'pause' or 'continue' and Enter to control processing");
}

/// Prints the summary of an analysis batch.
///
/// Returns an error when every attempted part failed.
pub fn report_batch(summary: &BatchSummary) -> CliResult<()> {
    terminal::print_section("Summary");
    if summary.videos > 0 {
        terminal::print_status("Videos", &summary.videos.to_string(), false);
        if summary.videos_failed > 0 {
            terminal::print_status("Videos Failed", &summary.videos_failed.to_string(), false);
        }
    }
    terminal::print_status("Parts", &summary.parts_total().to_string(), false);
    terminal::print_status("Succeeded", &summary.parts_succeeded.to_string(), false);
    terminal::print_status("Failed", &summary.parts_failed.to_string(), false);
    terminal::print_status("Clips", &summary.clips_created.to_string(), true);
    if summary.clips_failed > 0 {
        terminal::print_status("Clips Failed", &summary.clips_failed.to_string(), false);
    }
    for merged in &summary.merged_timelines {
        terminal::print_status("Timeline", &merged.display().to_string(), false);
    }
    terminal::print_status(
        "Total time",
        &clipmine_core::format_duration(summary.elapsed.as_secs_f64()),
        true,
    );

    if summary.all_failed() {
        return Err(crate::cli_error!("{}", batch_failure_message(summary)));
    }
    Ok(())
}

/// What failed in a batch where nothing succeeded.
fn batch_failure_message(summary: &BatchSummary) -> String {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    match (summary.parts_total(), summary.videos_failed) {
        (0, videos) => format!(
            "All {} video{} failed before any part was analyzed",
            videos,
            plural(videos)
        ),
        (parts, 0) => format!("All {} part{} failed", parts, plural(parts)),
        (parts, videos) => format!(
            "All {} part{} failed and {} video{} could not be split",
            parts,
            plural(parts),
            videos,
            plural(videos)
        ),
    }
}

/// Prints success/failure counts of a simple batch and fails when nothing
/// succeeded.
pub fn report_counts(what: &str, succeeded: usize, failed: usize, elapsed: Duration) -> CliResult<()> {
    terminal::print_section("Summary");
    terminal::print_status("Succeeded", &succeeded.to_string(), false);
    terminal::print_status("Failed", &failed.to_string(), false);
    terminal::print_status(
        "Total time",
        &clipmine_core::format_duration(elapsed.as_secs_f64()),
        true,
    );

    if succeeded == 0 && failed > 0 {
        return Err(crate::cli_error!("All {} {} failed", failed, what));
    }
    Ok(())
}
