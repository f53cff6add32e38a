//! Implementation of the 'compress' subcommand.
//!
//! Each file is compressed into its video's `compressed` directory as
//! `<stem>_compressed.mp4`. Failures are counted; the command fails only when
//! no file could be compressed.

use crate::cli::{Cli, CompressArgs};
use crate::commands::report_counts;
use crate::error::CliResult;

use clipmine_core::external::{FfmpegSpawner, SidecarSpawner, check_dependency};
use clipmine_core::naming::{base_name_of, compressed_stem};
use clipmine_core::processing::compress_video;
use clipmine_core::utils::calculate_size_reduction;
use clipmine_core::{CoreResult, MetadataStore, format_bytes, terminal};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub fn run_compress(cli: &Cli, args: CompressArgs) -> CliResult<()> {
    check_dependency("ffmpeg")?;
    let started = Instant::now();
    let store = MetadataStore::new(&cli.output_root);

    terminal::print_section("Compress");
    terminal::print_status("Files", &args.files.len().to_string(), false);
    terminal::print_status(
        "Target size",
        &format!("{} MB", args.compression.target_size_mb),
        false,
    );
    if args.compression.remove_audio {
        terminal::print_status("Audio", "removed", false);
    }

    let (mut succeeded, mut failed) = (0, 0);
    for (i, file) in args.files.iter().enumerate() {
        terminal::print_processing(&format!(
            "[{}/{}] {}",
            i + 1,
            args.files.len(),
            file.display()
        ));
        match compress_one(&SidecarSpawner, &store, file, &args) {
            Ok(Some(output)) => {
                succeeded += 1;
                let before = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
                let after = fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
                terminal::print_status("Output", &output.display().to_string(), false);
                terminal::print_status("Input size", &format_bytes(before), false);
                terminal::print_status("Output size", &format_bytes(after), true);
                terminal::print_status(
                    "Reduction",
                    &format!("{}%", calculate_size_reduction(before, after)),
                    true,
                );
            }
            Ok(None) => failed += 1,
            Err(e) => {
                log::error!("{}: {}", file.display(), e);
                failed += 1;
            }
        }
    }

    report_counts("files", succeeded, failed, started.elapsed())
}

/// Compresses `file`; `Ok(None)` when ffmpeg could not produce the output.
fn compress_one<S: FfmpegSpawner>(
    spawner: &S,
    store: &MetadataStore,
    file: &Path,
    args: &CompressArgs,
) -> CoreResult<Option<PathBuf>> {
    let base_name = base_name_of(file)?;
    let layout = store.ensure_layout(&base_name)?;
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| base_name.clone());
    let output = layout.compressed.join(format!("{}.mp4", compressed_stem(&stem)));

    let ok = compress_video(
        spawner,
        file,
        &output,
        args.compression.target_size_mb,
        args.compression.remove_audio,
    )?;
    Ok(ok.then_some(output))
}
