//! Implementation of the 'probe' subcommand.

use crate::cli::ProbeArgs;
use crate::error::CliResult;

use clipmine_core::external::{SidecarSpawner, check_dependency};
use clipmine_core::processing::probe_duration;
use clipmine_core::{CoreError, format_duration, terminal};

/// Prints the duration of one media file.
///
/// Probing never fails on its own; an unknown duration (`0.0`) is reported
/// as an error so scripts can tell.
pub fn run_probe(args: ProbeArgs) -> CliResult<()> {
    check_dependency("ffmpeg")?;
    if !args.file.is_file() {
        return Err(CoreError::PathError(format!(
            "{} does not exist",
            args.file.display()
        )));
    }

    let seconds = probe_duration(&SidecarSpawner, &args.file);
    terminal::print_section("Probe");
    terminal::print_status("File", &args.file.display().to_string(), false);
    if seconds <= 0.0 {
        terminal::print_status("Duration", "unknown", false);
        return Err(crate::cli_error!(
            "Could not determine the duration of {}",
            args.file.display()
        ));
    }

    terminal::print_status("Duration", &format_duration(seconds), true);
    terminal::print_status("Seconds", &format!("{seconds:.2}"), false);
    Ok(())
}
