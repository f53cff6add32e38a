//! Markdown report of one part's analysis conversation.
//!
//! The report keeps everything needed to audit a part later: the prompts of
//! both rounds, the model's answers, token usage and response time. It is
//! written to `<analysis>/<stem>_analysis.md`.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

use super::RoundOutcome;
use crate::error::CoreResult;

/// Both rounds of one part's conversation.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Position of the part in the batch, 1-based
    pub index: usize,
    pub total: usize,
    pub created_at: DateTime<Local>,
    /// Video that was analyzed
    pub video: PathBuf,
    pub model_name: String,
    /// Image path as it should appear in the Markdown link
    pub image_link: String,
    pub character_prompt: String,
    pub character_round: RoundOutcome,
    pub video_prompt: String,
    pub video_round: RoundOutcome,
}

impl AnalysisReport {
    pub fn total_tokens(&self) -> u64 {
        self.character_round.generation.usage.total_tokens
            + self.video_round.generation.usage.total_tokens
    }

    pub fn total_response_time(&self) -> Duration {
        self.character_round.elapsed + self.video_round.elapsed
    }
}

fn write_token_table(
    f: &mut fmt::Formatter<'_>,
    round: &RoundOutcome,
    with_time: bool,
) -> fmt::Result {
    let usage = &round.generation.usage;
    writeln!(f, "### Token usage")?;
    writeln!(f, "| Type | Count |")?;
    writeln!(f, "|------|-------|")?;
    writeln!(f, "| Input tokens | {} |", usage.prompt_tokens)?;
    writeln!(f, "| Output tokens | {} |", usage.response_tokens)?;
    writeln!(f, "| Total tokens | {} |", usage.total_tokens)?;
    if with_time {
        writeln!(f, "| Response time | {:.2}s |", round.elapsed.as_secs_f64())?;
    }
    writeln!(f)
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Video analysis session [{}/{}]\n", self.index, self.total)?;

        writeln!(f, "## Basic information")?;
        writeln!(f, "- **Time**: {}", self.created_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "- **Video**: {}", self.video.display())?;
        writeln!(f, "- **Model**: {}\n", self.model_name)?;

        writeln!(f, "## Round 1: character features\n")?;
        writeln!(f, "### Input")?;
        writeln!(f, "- **Image**:\n\n![character]({})\n", self.image_link)?;
        writeln!(f, "- **Prompt**: {}\n", self.character_prompt)?;
        writeln!(f, "### Result")?;
        writeln!(f, "{}\n", self.character_round.generation.text)?;
        write_token_table(f, &self.character_round, false)?;

        writeln!(f, "## Round 2: video analysis\n")?;
        writeln!(f, "### Input")?;
        writeln!(f, "- **Prompt**: {}\n", self.video_prompt)?;
        writeln!(f, "### Result")?;
        writeln!(f, "{}\n", self.video_round.generation.text)?;
        write_token_table(f, &self.video_round, true)?;

        writeln!(f, "## Totals\n")?;
        writeln!(f, "| Metric | Value |")?;
        writeln!(f, "|--------|-------|")?;
        writeln!(f, "| Total tokens | {} |", self.total_tokens())?;
        writeln!(
            f,
            "| Total response time | {:.2}s |",
            self.total_response_time().as_secs_f64()
        )
    }
}

/// Path of `target` relative to `base`, when both are absolute or both
/// relative. Falls back to `target` itself otherwise.
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    if target.is_absolute() != base.is_absolute() {
        return target.to_path_buf();
    }

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

/// Markdown link target for `image` as seen from a file in `report_dir`.
///
/// Separators become `/` and spaces are escaped so renderers resolve it.
pub fn image_link(image: &Path, report_dir: &Path) -> String {
    relative_path(image, report_dir)
        .to_string_lossy()
        .replace('\\', "/")
        .replace(' ', "%20")
}

/// Writes `report` to `<dir>/<stem>_analysis.md` and returns the path.
pub fn write_analysis_report(
    dir: &Path,
    stem: &str,
    report: &AnalysisReport,
) -> CoreResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{stem}_analysis.md"));
    fs::write(&path, report.to_string())?;
    log::info!("Analysis report saved to {}", path.display());
    Ok(path)
}
