// ============================================================================
// clipmine-cli/src/cli.rs
// ============================================================================
//
// COMMAND-LINE ARGUMENTS: clap Definitions for Every Subcommand
//
// Global options (output root, log directory, verbosity) apply to all
// subcommands. Analysis settings are shared by `analyze` and `run` through a
// flattened argument group; credentials fall back to environment variables,
// which may come from a `.env` file loaded before parsing.
//
// AI-ASSISTANT-INFO: clap derive structures for the clipmine CLI

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use clipmine_core::analysis::DEFAULT_MODEL;
use clipmine_core::config::DEFAULT_TARGET_SIZE_MB;
use clipmine_core::store::DEFAULT_OUTPUT_ROOT;

// ============================================================================
// TOP LEVEL
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Clipmine: find a character in long videos and cut the clips",
    long_about = "Splits videos into parts, asks a hosted multimodal model where a reference \
                  character appears, records the answers as JSON and cuts the matching clips."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of the per-video output tree
    #[arg(long, global = true, value_name = "DIR", default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_root: PathBuf,

    /// Directory for log files (defaults to OUTPUT_ROOT/logs)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn effective_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.output_root.join("logs"))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Prints the duration of a media file
    Probe(ProbeArgs),
    /// Compresses videos to a target size
    Compress(CompressArgs),
    /// Splits a video into fixed-length parts with empty records
    Split(SplitArgs),
    /// Analyzes existing parts, writes reports and records, cuts clips
    Analyze(AnalyzeArgs),
    /// Merges part records into one timeline
    Merge(MergeArgs),
    /// Cuts the clips of a timeline or part record from a video
    Extract(ExtractArgs),
    /// Runs the whole pipeline on files or directories
    Run(RunArgs),
}

impl Commands {
    /// Name used in log file names.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Probe(_) => "probe",
            Commands::Compress(_) => "compress",
            Commands::Split(_) => "split",
            Commands::Analyze(_) => "analyze",
            Commands::Merge(_) => "merge",
            Commands::Extract(_) => "extract",
            Commands::Run(_) => "run",
        }
    }
}

// ============================================================================
// STAGE COMMANDS
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Media file to probe
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CompressArgs {
    /// Videos to compress
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub compression: CompressionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompressionArgs {
    /// Target size of each compressed file in megabytes
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_TARGET_SIZE_MB)]
    pub target_size_mb: f64,

    /// Drop the audio track from compressed files
    #[arg(long, default_value_t = false)]
    pub remove_audio: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    /// Video to split
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// Length of each part in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 120,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub segment_duration: u32,
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Part records to merge
    #[arg(value_name = "JSONS", required_unless_present = "video", conflicts_with = "video")]
    pub records: Vec<PathBuf>,

    /// Merge every record of this video base name under the output root
    #[arg(long, value_name = "BASE")]
    pub video: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Video the timestamps refer to
    #[arg(long, required = true, value_name = "FILE")]
    pub video: PathBuf,

    /// Merged timeline or part record
    #[arg(long, required = true, value_name = "JSON")]
    pub timeline: PathBuf,

    /// Seconds added before and after each appearance
    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    pub buffer: f64,

    /// Directory for the clips (defaults to the video's extract directory)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

// ============================================================================
// ANALYSIS COMMANDS
// ============================================================================

/// Settings shared by every command that talks to the model.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Reference image of the character to look for
    #[arg(long, value_name = "IMAGE", env = "CLIPMINE_CHARACTER_IMAGE")]
    pub character_image: Option<PathBuf>,

    /// API key of the analysis service
    #[arg(long, value_name = "KEY", env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// HTTP(S) proxy for API traffic
    #[arg(long, value_name = "URL", env = "CLIPMINE_PROXY")]
    pub proxy: Option<String>,

    /// Model used for generation
    #[arg(long, value_name = "NAME", env = "CLIPMINE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// File with the first-round prompt (defaults to the built-in prompt)
    #[arg(long, value_name = "FILE")]
    pub character_prompt: Option<PathBuf>,

    /// File with the second-round prompt (defaults to the built-in prompt)
    #[arg(long, value_name = "FILE")]
    pub video_prompt: Option<PathBuf>,

    /// Upload the parts as they are instead of compressing them first
    #[arg(long, default_value_t = false)]
    pub no_compress: bool,

    #[command(flatten)]
    pub compression: CompressionArgs,

    /// Seconds added before and after each clip
    #[arg(long, value_name = "SECONDS", default_value_t = 2.0)]
    pub buffer: f64,

    /// Seconds to wait between parts
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<u64>,

    /// Attempts per API request before giving up
    #[arg(long, value_name = "COUNT", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: u32,

    /// ntfy.sh topic URL for batch notifications (e.g., https://ntfy.sh/your_topic)
    #[arg(long, value_name = "TOPIC_URL", env = "CLIPMINE_NTFY_TOPIC")]
    pub ntfy: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Part files named Part<N>_<base>.mp4, or directories containing them
    #[arg(required = true, value_name = "PARTS")]
    pub parts: Vec<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Source videos or directories of videos
    #[arg(required = true, value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Length of each part in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 120,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub segment_duration: u32,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "clipmine",
            "split",
            "show.mp4",
            "--output-root",
            "/tmp/out",
            "--segment-duration",
            "60",
        ])
        .unwrap();
        assert_eq!(cli.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(cli.effective_log_dir(), PathBuf::from("/tmp/out/logs"));
        match cli.command {
            Commands::Split(args) => assert_eq!(args.segment_duration, 60),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn merge_takes_records_or_a_video() {
        assert!(Cli::try_parse_from(["clipmine", "merge", "a.json", "b.json"]).is_ok());
        assert!(Cli::try_parse_from(["clipmine", "merge", "--video", "Show"]).is_ok());
        assert!(Cli::try_parse_from(["clipmine", "merge"]).is_err());
        assert!(Cli::try_parse_from(["clipmine", "merge", "a.json", "--video", "Show"]).is_err());
    }

    #[test]
    fn zero_segment_duration_is_rejected() {
        assert!(
            Cli::try_parse_from(["clipmine", "split", "show.mp4", "--segment-duration", "0"])
                .is_err()
        );
    }
}
