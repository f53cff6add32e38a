//! Terminal UI components and styling for clipmine.
//!
//! Consistent terminal output with a small hierarchy of sections, processing
//! steps and key-value status lines. Everything is emitted through the `log`
//! facade so the CLI's file log receives the same lines as the console.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Represents the visual hierarchy levels in the CLI output
#[derive(Debug, Clone, Copy)]
pub enum OutputLevel {
    /// Level 1: Main sections (===== SECTION =====)
    Section,
    /// Level 2: Subsections and major operations (» Operation)
    Subsection,
    /// Level 3: Progress items and sub-operations
    Progress,
    /// Level 4: Key-value status information
    Status,
}

impl OutputLevel {
    fn indent(&self) -> &'static str {
        match self {
            OutputLevel::Section => "",
            OutputLevel::Subsection => "  ",
            OutputLevel::Progress => "    ",
            OutputLevel::Status => "      ",
        }
    }
}

/// Column width of status labels.
const STATUS_LABEL_WIDTH: usize = 15;

static BATCH_PROGRESS: LazyLock<Mutex<Option<ProgressBar>>> = LazyLock::new(|| Mutex::new(None));

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print an item at the specified hierarchy level
pub fn print_item(level: OutputLevel, symbol: Option<&str>, text: &str, bold: bool) {
    let indent = level.indent();
    let prefix = symbol.map(|s| format!("{s} ")).unwrap_or_default();

    if should_use_color() && bold {
        info!("{indent}{prefix}{}", style(text).bold());
    } else {
        info!("{indent}{prefix}{text}");
    }
}

/// Print a subsection or processing step
pub fn print_processing(message: &str) {
    info!("");
    print_item(OutputLevel::Subsection, Some("»"), message, true);
}

/// Print a sub-item under a processing step
pub fn print_sub_item(message: &str) {
    print_item(OutputLevel::Progress, None, message, false);
}

/// Print a success message
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Formats a status line without color.
pub fn format_status_line(label: &str, value: &str) -> String {
    let padding = STATUS_LABEL_WIDTH.saturating_sub(label.width()).max(1);
    format!(
        "{}{}:{} {}",
        OutputLevel::Status.indent(),
        label,
        " ".repeat(padding),
        value
    )
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    if !should_use_color() {
        info!("{}", format_status_line(label, value));
        return;
    }

    let colored_value = match () {
        () if label.contains("Failed") && value.trim() != "0" => value.red().to_string(),
        () if label.contains("Succeeded") && value.trim() != "0" => value.green().to_string(),
        () if label.contains("Reduction") && value.ends_with('%') => {
            match value.trim_end_matches('%').parse::<u64>() {
                Ok(reduction) if reduction >= 50 => value.green().to_string(),
                _ => value.to_string(),
            }
        }
        () if highlight => value.bold().to_string(),
        () => value.to_string(),
    };
    info!("{}", format_status_line(label, &colored_value));
}

/// Print an error message
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        info!("✗ {}", title.red().bold());
    } else {
        info!("✗ {title}");
    }

    info!("");
    info!("  Message:  {message}");

    if let Some(suggestion_text) = suggestion {
        info!("");
        info!("  Suggestion: {suggestion_text}");
    }

    info!("");
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", message.yellow());
    } else {
        info!("  ⚠ {message}");
    }
}

fn batch_progress_style() -> ProgressStyle {
    let term_width = Term::stderr().size().1 as usize;
    let template = if term_width >= 100 {
        "  ⧖ {msg:<28} [{bar:30}] {pos}/{len} ({elapsed_precise})"
    } else if term_width >= 60 {
        "  ⧖ [{bar:20}] {pos}/{len} {msg}"
    } else {
        "  ⧖ {pos}/{len}"
    };
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.")
}

/// Starts a progress bar over `total` parts. Hidden when stderr is not a
/// terminal.
pub fn start_batch_progress(total: usize) {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(batch_progress_style());
    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.enable_steady_tick(Duration::from_millis(250));

    if let Ok(mut slot) = BATCH_PROGRESS.lock() {
        if let Some(old) = slot.replace(pb) {
            old.finish_and_clear();
        }
    }
}

/// Shows which part is being worked on.
pub fn set_batch_progress_message(message: &str) {
    if let Ok(slot) = BATCH_PROGRESS.lock() {
        if let Some(pb) = slot.as_ref() {
            pb.set_message(message.to_string());
        }
    }
}

/// Counts one finished part.
pub fn advance_batch_progress() {
    if let Ok(slot) = BATCH_PROGRESS.lock() {
        if let Some(pb) = slot.as_ref() {
            pb.inc(1);
        }
    }
}

/// Finish the current progress bar (leave final state visible)
pub fn finish_batch_progress() {
    if let Ok(mut slot) = BATCH_PROGRESS.lock() {
        if let Some(pb) = slot.take() {
            pb.finish();
        }
    }
}
