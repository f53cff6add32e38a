// ============================================================================
// clipmine-core/src/processing/pipeline.rs
// ============================================================================
//
// BATCH PIPELINE: Split, Analyze, Annotate and Cut
//
// Orchestrates the full workflow for a batch of source videos:
//
// 1. Split each source into parts and write an empty record per part
// 2. For every part: compress for upload (optional), run the two-round
//    conversation, write the Markdown report, extract the appearances from
//    the answer, rewrite the part's record, cut the clips
// 3. Merge all records of the source into one timeline
//
// A failing part never stops the batch; it is counted and the next part
// starts. Batch-level failures (the character image cannot be uploaded)
// end the batch with an error notification.
//
// AI-ASSISTANT-INFO: Batch orchestration of the segment analysis pipeline

// ---- Internal crate imports ----
use crate::analysis::{
    AnalysisClient, AnalysisReport, ChatSession, ContentPart, DEFAULT_MODEL, ProcessingPoller,
    UploadedFile, image_link, poll::settled_to_result, upload_with_retry, write_analysis_report,
};
use crate::annotations::extract_appearances;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::FfmpegSpawner;
use crate::metadata::{merge_and_write, normalize_appearances};
use crate::naming::PartId;
use crate::notifications::{NotificationSender, NotificationType};
use crate::pause::PauseSignal;
use crate::processing::clips::{ClipBatchReport, clip_requests_for_part, extract_clips};
use crate::processing::compress::compress_for_upload;
use crate::processing::probe::probe_duration_secs;
use crate::processing::segment::split_video;
use crate::retry::RetryPolicy;
use crate::store::MetadataStore;
use crate::terminal;

// ---- External crate imports ----
use chrono::Local;

// ---- Standard library imports ----
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// CONTEXT AND RESULTS
// ============================================================================

/// Everything a pipeline run needs.
pub struct PipelineContext<'a, S: FfmpegSpawner, C: AnalysisClient> {
    pub spawner: &'a S,
    pub client: &'a C,
    pub config: &'a CoreConfig,
    pub notifier: &'a dyn NotificationSender,
    pub store: MetadataStore,
    pub pause: Option<&'a PauseSignal>,
}

impl<'a, S: FfmpegSpawner, C: AnalysisClient> PipelineContext<'a, S, C> {
    /// Context writing below `config.output_root`.
    pub fn new(
        spawner: &'a S,
        client: &'a C,
        config: &'a CoreConfig,
        notifier: &'a dyn NotificationSender,
    ) -> Self {
        Self {
            spawner,
            client,
            config,
            notifier,
            store: MetadataStore::new(&config.output_root),
            pause: None,
        }
    }

    /// Checks the pause signal between steps.
    pub fn with_pause(mut self, pause: &'a PauseSignal) -> Self {
        self.pause = Some(pause);
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.config
            .api
            .as_ref()
            .map(|api| api.retry_policy)
            .unwrap_or_default()
    }

    fn model_name(&self) -> &str {
        self.config
            .api
            .as_ref()
            .map(|api| api.model_name.as_str())
            .unwrap_or(DEFAULT_MODEL)
    }

    fn pause_gate(&self) {
        if let Some(pause) = self.pause {
            pause.wait_if_paused();
        }
    }
}

/// What happened to one part.
#[derive(Debug, Clone, PartialEq)]
pub struct PartOutcome {
    pub part: PartId,
    /// Appearances written to the record
    pub appearances: usize,
    pub record_path: PathBuf,
    pub report_path: PathBuf,
    pub clips: ClipBatchReport,
}

/// Counters of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Source videos given to the batch
    pub videos: usize,
    /// Source videos that could not be split
    pub videos_failed: usize,
    pub parts_succeeded: usize,
    pub parts_failed: usize,
    pub clips_created: usize,
    pub clips_failed: usize,
    /// Merged timelines written, one per source video with records
    pub merged_timelines: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn parts_total(&self) -> usize {
        self.parts_succeeded + self.parts_failed
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        let attempted = self.parts_total() + self.videos_failed;
        attempted > 0 && self.parts_succeeded == 0
    }

    fn record(&mut self, result: &CoreResult<PartOutcome>) {
        match result {
            Ok(outcome) => {
                self.parts_succeeded += 1;
                self.clips_created += outcome.clips.created.len();
                self.clips_failed += outcome.clips.failures.len();
            }
            Err(_) => self.parts_failed += 1,
        }
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Runs the full pipeline for every source video in `inputs`.
pub fn process_videos<S: FfmpegSpawner, C: AnalysisClient>(
    ctx: &PipelineContext<'_, S, C>,
    inputs: &[PathBuf],
) -> CoreResult<BatchSummary> {
    let started = Instant::now();
    let hostname = current_hostname();
    let mut summary = BatchSummary {
        videos: inputs.len(),
        ..Default::default()
    };

    ctx.notifier.notify(&NotificationType::BatchStart {
        video_count: inputs.len(),
        hostname: hostname.clone(),
    });

    let character = match prepare_character_image(ctx) {
        Ok(file) => file,
        Err(e) => {
            ctx.notifier.notify(&NotificationType::BatchError {
                message: e.to_string(),
                hostname,
            });
            return Err(e);
        }
    };

    for (i, input) in inputs.iter().enumerate() {
        terminal::print_section(&format!("Video {}/{}", i + 1, inputs.len()));
        terminal::print_processing(&input.display().to_string());

        ctx.pause_gate();
        let parts = match split_video(
            ctx.spawner,
            &ctx.store,
            input,
            ctx.config.segment_duration_secs,
        ) {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("Skipping {}: {}", input.display(), e);
                summary.videos_failed += 1;
                continue;
            }
        };

        let part_paths: Vec<PathBuf> = parts.iter().map(|p| p.path.clone()).collect();
        run_parts(ctx, &character, &part_paths, &mut summary);

        if let Some(first) = parts.first() {
            if let Some(merged) = merge_video_records(&ctx.store, &first.id.base_name) {
                summary.merged_timelines.push(merged);
            }
        }
    }

    summary.elapsed = started.elapsed();
    ctx.notifier.notify(&NotificationType::BatchComplete {
        succeeded: summary.parts_succeeded,
        failed: summary.parts_failed,
        clips: summary.clips_created,
        duration: summary.elapsed,
        hostname,
    });
    Ok(summary)
}

/// Runs only the analysis stage for existing part files.
///
/// Parts without a record get one, with a probed duration.
pub fn analyze_parts<S: FfmpegSpawner, C: AnalysisClient>(
    ctx: &PipelineContext<'_, S, C>,
    part_paths: &[PathBuf],
) -> CoreResult<BatchSummary> {
    let started = Instant::now();
    let mut summary = BatchSummary::default();

    let character = prepare_character_image(ctx)?;
    run_parts(ctx, &character, part_paths, &mut summary);

    summary.elapsed = started.elapsed();
    Ok(summary)
}

/// Merges every record of `base_name` and writes the timeline.
///
/// Returns the written path, or `None` when there was nothing to merge or the
/// merge failed (logged).
pub fn merge_video_records(store: &MetadataStore, base_name: &str) -> Option<PathBuf> {
    let records = match store.list_records(base_name) {
        Ok(records) => records,
        Err(e) => {
            log::error!("Cannot list records of {}: {}", base_name, e);
            return None;
        }
    };
    if records.is_empty() {
        log::warn!("No records to merge for {}", base_name);
        return None;
    }

    match merge_and_write(&records) {
        Ok((timeline, path)) => {
            log::info!(
                "Merged {} parts of {} ({} appearances, {}s) into {}",
                timeline.part_durations.len(),
                base_name,
                timeline.appearances.len(),
                timeline.total_duration_seconds,
                path.display()
            );
            Some(path)
        }
        Err(e) => {
            log::error!("Merging records of {} failed: {}", base_name, e);
            None
        }
    }
}

// ============================================================================
// PER-PART WORK
// ============================================================================

/// Uploads the character reference image and waits until it is usable.
fn prepare_character_image<S: FfmpegSpawner, C: AnalysisClient>(
    ctx: &PipelineContext<'_, S, C>,
) -> CoreResult<UploadedFile> {
    let image = ctx.config.require_character_image()?;
    let file = upload_with_retry(ctx.client, &ctx.retry_policy(), image)?;
    let state = ProcessingPoller::new(ctx.client, &file, ctx.config.poll).wait_until_settled();
    settled_to_result(&state, &file.name)?;
    Ok(file)
}

fn run_parts<S: FfmpegSpawner, C: AnalysisClient>(
    ctx: &PipelineContext<'_, S, C>,
    character: &UploadedFile,
    part_paths: &[PathBuf],
    summary: &mut BatchSummary,
) {
    let total = part_paths.len();
    terminal::start_batch_progress(total);

    for (i, part_path) in part_paths.iter().enumerate() {
        let name = part_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        terminal::set_batch_progress_message(&name);
        log::info!("=== Part {}/{}: {} ===", i + 1, total, name);

        let result = analyze_part(ctx, character, part_path, i + 1, total);
        match &result {
            Ok(outcome) => log::info!(
                "[{}/{}] {}: {} appearances, {} clips",
                i + 1,
                total,
                outcome.part,
                outcome.appearances,
                outcome.clips.created.len()
            ),
            Err(e) => log::error!("[{}/{}] {} failed: {}", i + 1, total, name, e),
        }
        summary.record(&result);
        terminal::advance_batch_progress();

        if i + 1 < total && !ctx.config.delay_between_parts.is_zero() {
            log::info!(
                "Waiting {}s before the next part",
                ctx.config.delay_between_parts.as_secs()
            );
            thread::sleep(ctx.config.delay_between_parts);
        }
    }

    terminal::finish_batch_progress();
}

/// Analyzes one part end to end.
pub fn analyze_part<S: FfmpegSpawner, C: AnalysisClient>(
    ctx: &PipelineContext<'_, S, C>,
    character: &UploadedFile,
    part_path: &Path,
    index: usize,
    total: usize,
) -> CoreResult<PartOutcome> {
    let part = PartId::from_path(part_path)?;
    let stem = part_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| CoreError::PathError(format!("No file name in {}", part_path.display())))?;
    let layout = ctx.store.ensure_layout(&part.base_name)?;
    let config = ctx.config;
    let policy = ctx.retry_policy();

    ctx.pause_gate();
    let upload_path = if config.enable_compression {
        compress_for_upload(
            ctx.spawner,
            part_path,
            &layout.compressed,
            config.target_size_mb,
            config.remove_audio,
        )
    } else {
        part_path.to_path_buf()
    };

    // Round 1: character reference
    ctx.pause_gate();
    let mut session = ChatSession::new(policy);
    let character_round = session.send(
        ctx.client,
        vec![
            ContentPart::Text(config.character_prompt.clone()),
            ContentPart::file(character),
        ],
        &format!("Character analysis for {part}"),
    )?;
    log::debug!("Character analysis: {}", character_round.generation.text);

    // Round 2: the part itself
    ctx.pause_gate();
    let video = upload_with_retry(ctx.client, &policy, &upload_path)?;
    let state = ProcessingPoller::new(ctx.client, &video, config.poll).wait_until_settled();
    settled_to_result(&state, &video.name)?;

    let video_round = session.send(
        ctx.client,
        vec![
            ContentPart::Text(config.video_prompt.clone()),
            ContentPart::file(&video),
        ],
        &format!("Video analysis for {part}"),
    )?;

    let report = AnalysisReport {
        index,
        total,
        created_at: Local::now(),
        video: part_path.to_path_buf(),
        model_name: ctx.model_name().to_string(),
        image_link: config
            .character_image
            .as_deref()
            .map(|image| image_link(image, &layout.analysis))
            .unwrap_or_default(),
        character_prompt: config.character_prompt.clone(),
        character_round,
        video_prompt: config.video_prompt.clone(),
        video_round,
    };
    let report_path = write_analysis_report(&layout.analysis, &stem, &report)?;

    ctx.pause_gate();
    let raw = extract_appearances(&report.video_round.generation.text)?;
    let events = normalize_appearances(raw, part.sequence);
    let record_path = ctx.store.replace_appearances(&part, events.clone(), || {
        probe_duration_secs(ctx.spawner, part_path)
    })?;
    log::info!(
        "Wrote {} appearances to {}",
        events.len(),
        record_path.display()
    );

    ctx.pause_gate();
    let requests = clip_requests_for_part(&events, &part.label());
    let clips = extract_clips(
        ctx.spawner,
        part_path,
        &requests,
        config.clip_buffer_secs,
        &layout.extract,
    );

    Ok(PartOutcome {
        part,
        appearances: events.len(),
        record_path,
        report_path,
        clips,
    })
}

/// Distinct source names of `part_paths`, for merging after `analyze_parts`.
pub fn base_names_of(part_paths: &[PathBuf]) -> Vec<String> {
    part_paths
        .iter()
        .filter_map(|p| PartId::from_path(p).ok())
        .map(|id| id.base_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn current_hostname() -> String {
    hostname::get()
        .map(|s| {
            s.into_string()
                .unwrap_or_else(|_| "unknown-host-invalid-utf8".to_string())
        })
        .unwrap_or_else(|_| "unknown-host-error".to_string())
}
