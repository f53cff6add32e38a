// clipmine-cli/tests/cli_integration.rs
//
// Runs the compiled binary on commands that need neither ffmpeg nor network
// access: help output, merging records and the configuration checks of the
// analysis commands.

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::{Value, json};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn clipmine_cmd(work_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipmine").expect("Failed to find clipmine binary");
    cmd.current_dir(work_dir)
        .env("NO_COLOR", "1")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("CLIPMINE_CHARACTER_IMAGE")
        .env_remove("CLIPMINE_NTFY_TOPIC");
    cmd
}

/// Writes two part records of `Show` the way the splitter and analyzer leave
/// them, and returns their paths.
fn write_records(outputs: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let dir = outputs.join("Show").join("splitjson");
    fs::create_dir_all(&dir)?;

    let part1 = dir.join("Part1_Show.json");
    fs::write(
        &part1,
        serde_json::to_string_pretty(&json!({
            "Part1_Show_time": "120",
            "Appearances": []
        }))?,
    )?;

    let part2 = dir.join("Part2_Show.json");
    fs::write(
        &part2,
        serde_json::to_string_pretty(&json!({
            "Part2_Show_time": "30",
            "Appearances": [{
                "part": "Part2",
                "clip": "clip_1",
                "start": "0:05",
                "end": "0:09",
                "description": "Turns towards the camera"
            }]
        }))?,
    )?;

    Ok(vec![part1, part2])
}

fn merged_timelines(dir: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let mut timelines = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if name.starts_with("Show_all_") {
            timelines.push(serde_json::from_str(&fs::read_to_string(&path)?)?);
        }
    }
    Ok(timelines)
}

#[test]
fn test_help_lists_commands() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    clipmine_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("analyze"))
        .stdout(contains("merge"))
        .stdout(contains("extract"));
    Ok(())
}

#[test]
fn test_merge_records_in_part_order() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let outputs = dir.path().join("outputs");
    let records = write_records(&outputs)?;

    // Given out of order on purpose.
    clipmine_cmd(dir.path())
        .arg("--output-root")
        .arg(&outputs)
        .arg("merge")
        .arg(&records[1])
        .arg(&records[0])
        .assert()
        .success()
        .stdout(contains("Timeline written to"));

    let timelines = merged_timelines(&outputs.join("Show").join("splitjson"))?;
    assert_eq!(timelines.len(), 1);
    let timeline = &timelines[0];
    assert_eq!(timeline["total_time"], 150);
    assert_eq!(timeline["part_times"][0]["part"], "Part1_Show");
    assert_eq!(timeline["part_times"][1]["part"], "Part2_Show");
    assert_eq!(timeline["Appearances"][0]["clip"], "clip_1");

    // The run wrote its own log file.
    let logs: Vec<_> = fs::read_dir(outputs.join("logs"))?.collect();
    assert_eq!(logs.len(), 1);
    Ok(())
}

#[test]
fn test_merge_by_video_name() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let outputs = dir.path().join("outputs");
    write_records(&outputs)?;

    clipmine_cmd(dir.path())
        .arg("--output-root")
        .arg(&outputs)
        .args(["merge", "--video", "Show"])
        .assert()
        .success();

    let timelines = merged_timelines(&outputs.join("Show").join("splitjson"))?;
    assert_eq!(timelines.len(), 1);
    assert_eq!(timelines[0]["Appearances"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn test_merge_unknown_video_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    clipmine_cmd(dir.path())
        .arg("--output-root")
        .arg(dir.path().join("outputs"))
        .args(["merge", "--video", "Missing"])
        .assert()
        .failure()
        .stderr(contains("Nothing merged for Missing"));
    Ok(())
}

#[test]
fn test_analyze_without_api_key_fails_before_work() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let part = dir.path().join("Part1_Show.mp4");
    fs::write(&part, b"not really a video")?;

    clipmine_cmd(dir.path())
        .arg("--output-root")
        .arg(dir.path().join("outputs"))
        .arg("analyze")
        .arg(&part)
        .assert()
        .failure()
        .stderr(contains("Configuration error"))
        .stderr(contains("API key"));

    // Nothing was created for the video.
    assert!(!dir.path().join("outputs").join("Show").exists());
    Ok(())
}

#[test]
fn test_run_requires_character_image() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let video = dir.path().join("Show.mp4");
    fs::write(&video, b"not really a video")?;

    clipmine_cmd(dir.path())
        .arg("--output-root")
        .arg(dir.path().join("outputs"))
        .arg("run")
        .arg(&video)
        .args(["--api-key", "test-key"])
        .assert()
        .failure()
        .stderr(contains("character reference image"));
    Ok(())
}

#[test]
fn test_merge_requires_records_or_video() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    clipmine_cmd(dir.path()).arg("merge").assert().failure();
    Ok(())
}
