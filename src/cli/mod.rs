//! Command-line interface for hypeclip.
//!
//! Provides commands for clipping a recording, analyzing a transcript
//! offline, inspecting projects, trimming clips and showing configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::{Ffmpeg, TwitchDownloaderCli, YtDlp};
use crate::analysis::{analyze, DetectionMode};
use crate::config::{self, ResolvedConfig};
use crate::core::{ClipRequest, Clipper, ClipperSettings, ProjectLog, StatusBoard};
use crate::domain::{format_timecode, parse_timecode, ProjectState, Transcript};

/// hypeclip - Find hype moments in stream chat and clip them
#[derive(Parser, Debug)]
#[command(name = "hypeclip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find hype moments in a VOD and clip them
    Clip {
        /// VOD URL (e.g. https://www.twitch.tv/videos/123456789)
        vod_url: String,

        /// Start of the range to scan
        #[arg(long, value_parser = parse_timecode, default_value = "0:00:00")]
        start: u64,

        /// End of the range to scan
        #[arg(long, value_parser = parse_timecode)]
        end: u64,

        /// Maximum clips processed at once
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Detection mode
        #[arg(short, long, value_enum)]
        mode: Option<DetectionMode>,

        /// Directory for finished clips (default: <clips_dir>/<project_id>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect hype moments in a downloaded chat transcript
    Analyze {
        /// Chat JSON file (TwitchDownloaderCLI format)
        path: PathBuf,

        /// Detection mode
        #[arg(short, long, value_enum, default_value = "hybrid")]
        mode: DetectionMode,
    },

    /// Check the status of a project
    Status {
        /// Project ID (UUID)
        project_id: String,
    },

    /// List recent projects
    Projects {
        /// Maximum number of projects to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Crop an existing clip
    Trim {
        /// Clip to crop
        input: PathBuf,

        /// Start offset within the clip
        #[arg(long, value_parser = parse_timecode)]
        start: u64,

        /// End offset within the clip
        #[arg(long, value_parser = parse_timecode)]
        end: u64,

        /// Output file (default: <input>_trimmed.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Clip {
                vod_url,
                start,
                end,
                parallel,
                mode,
                output,
            } => clip_vod(&vod_url, start, end, parallel, mode, output).await,
            Commands::Analyze { path, mode } => analyze_transcript(&path, mode).await,
            Commands::Status { project_id } => show_status(&project_id).await,
            Commands::Projects { limit } => list_projects(limit).await,
            Commands::Trim {
                input,
                start,
                end,
                output,
            } => trim_clip(&input, start, end, output).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Build a clipper wired to the real external tools
fn build_clipper(cfg: &ResolvedConfig, settings: ClipperSettings) -> (Clipper, Arc<StatusBoard>) {
    let tools = &cfg.tools;
    let board = Arc::new(StatusBoard::new());

    let clipper = Clipper::new(
        Arc::new(TwitchDownloaderCli::with_binary_path(&tools.twitch_downloader)),
        Arc::new(YtDlp::new(tools.download.clone()).with_binary_path(&tools.yt_dlp)),
        Arc::new(Ffmpeg::new(tools.encode.clone()).with_binary_path(&tools.ffmpeg)),
        board.clone(),
        settings,
    );

    (clipper, board)
}

/// Run a full clipping request
async fn clip_vod(
    vod_url: &str,
    start: u64,
    end: u64,
    parallel: Option<usize>,
    mode: Option<DetectionMode>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::config()?;

    let mut settings = ClipperSettings::from_config(cfg);
    if let Some(parallel) = parallel {
        settings.pipeline.max_parallel = parallel;
    }
    if let Some(mode) = mode {
        settings.mode = mode;
    }

    let log = ProjectLog::create_in(&cfg.projects_dir(), vod_url).await?;
    eprintln!("[Project {}]", log.project_id());

    let (clipper, _board) = build_clipper(cfg, settings);

    // Ctrl-C cancels outstanding clip jobs
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling clip jobs");
            on_interrupt.cancel();
        }
    });

    let mut request = ClipRequest::new(vod_url, start, end);
    if let Some(output) = output {
        request = request.with_output_dir(output);
    }
    let report = clipper.run(&request, &log, &cancel).await?;

    for output in &report.batch.outputs {
        println!("{}", output.path.display());
    }
    for failure in &report.batch.failures {
        eprintln!(
            "  clip {} ({}) failed: {}",
            failure.index + 1,
            failure.window,
            failure.error
        );
    }
    eprintln!("\n[{}]", report.batch.summary());

    if report.batch.is_total_failure() {
        anyhow::bail!("No clips could be produced for project {}", report.project_id);
    }

    Ok(())
}

/// Offline detection on a transcript file
async fn analyze_transcript(path: &Path, mode: DetectionMode) -> Result<()> {
    let cfg = config::config()?;

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    let transcript = Transcript::from_json(&content)
        .with_context(|| format!("Failed to parse transcript: {}", path.display()))?;

    let analysis = analyze(&transcript.events, mode, &cfg.detection, &cfg.windows)?;

    println!(
        "{} messages over {}",
        analysis.event_count,
        format_timecode(analysis.duration_seconds)
    );
    println!();
    println!("{:<6} {:<10} {:<8}", "RANK", "TIME", "HEIGHT");
    println!("{}", "-".repeat(26));
    for (rank, spike) in analysis.spikes.iter().enumerate() {
        println!(
            "{:<6} {:<10} {:<8}",
            rank + 1,
            format_timecode(spike.second),
            spike.height
        );
    }
    println!();
    println!("Windows:");
    for (index, window) in analysis.windows.iter().enumerate() {
        println!("  clip {}: {} ({}s)", index + 1, window, window.duration_seconds());
    }

    Ok(())
}

/// Show the status of a project
async fn show_status(project_id_str: &str) -> Result<()> {
    let project_id = Uuid::parse_str(project_id_str)
        .with_context(|| format!("Invalid project ID: {}", project_id_str))?;

    let base = ProjectLog::base_directory()?;
    if !base.join(project_id.to_string()).exists() {
        anyhow::bail!("No project found with ID {}", project_id);
    }

    let log = ProjectLog::open_in(&base, project_id).await?;
    let project = log
        .project()
        .await?
        .with_context(|| format!("No events found for project {}", project_id))?;

    println!("Project ID: {}", project.id);
    println!("VOD: {}", project.vod_url);
    println!("Status: {}", project.status_line());
    println!("Created: {}", project.created_at);
    if let Some(completed) = project.completed_at {
        println!("Finished: {}", completed);
    }

    if !project.clips.is_empty() {
        println!("\nClips:");
        for clip in &project.clips {
            println!("  {} {}", clip.window, clip.path.display());
        }
    }
    if !project.failures.is_empty() {
        println!("\nFailures:");
        for failure in &project.failures {
            println!("  {} {}", failure.window, failure.error);
        }
    }
    if !project.skipped.is_empty() {
        println!("\nSkipped: {}", project.skipped.len());
    }

    Ok(())
}

/// List recent projects
async fn list_projects(limit: usize) -> Result<()> {
    let base = ProjectLog::base_directory()?;
    let projects = ProjectLog::load_projects_in(&base, limit).await?;

    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    println!("{:<38} {:<12} {:<40}", "PROJECT ID", "STATE", "VOD");
    println!("{}", "-".repeat(90));

    for project in projects {
        let state_str = match &project.state {
            ProjectState::Queued => "queued",
            ProjectState::Processing => "processing",
            ProjectState::Completed => "completed",
            ProjectState::Failed { .. } => "failed",
        };
        println!("{:<38} {:<12} {:<40}", project.id, state_str, project.vod_url);
    }

    Ok(())
}

/// Default trim target: `<stem>_trimmed.mp4` next to the input
fn trimmed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".to_string());
    input.with_file_name(format!("{}_trimmed.mp4", stem))
}

/// Crop an existing clip
async fn trim_clip(input: &Path, start: u64, end: u64, output: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;

    if !input.exists() {
        anyhow::bail!("Clip not found: {}", input.display());
    }

    let output = output.unwrap_or_else(|| trimmed_path(input));
    let ffmpeg = Ffmpeg::new(cfg.tools.encode.clone()).with_binary_path(&cfg.tools.ffmpeg);
    ffmpeg
        .trim(input, start, end, &output)
        .await
        .with_context(|| format!("Failed to trim {}", input.display()))?;

    println!("{}", output.display());
    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("hypeclip configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Projects: {}", cfg.projects_dir().display());
    println!("  Clips:    {}", cfg.clips_dir.display());
    println!();
    println!("Detection:");
    println!("  Mode:           {:?}", cfg.detection_mode);
    println!("  Min height:     {}", cfg.detection.min_height);
    println!("  Global top:     {}", cfg.detection.global_top);
    println!("  Segment length: {}s", cfg.detection.segment_length);
    println!("  Segment top:    {}", cfg.detection.segment_top);
    println!();
    println!("Windows:");
    println!("  Half width:   {}s", cfg.windows.half_width);
    println!("  Merge margin: {}s", cfg.windows.merge_margin);
    println!();
    println!("Pipeline:");
    println!("  Max parallel: {}", cfg.pipeline.max_parallel);
    match cfg.pipeline.job_timeout_seconds {
        Some(seconds) => println!("  Job timeout:  {}s", seconds),
        None => println!("  Job timeout:  (none)"),
    }
    println!();
    println!("Tools:");
    println!("  TwitchDownloaderCLI: {}", cfg.tools.twitch_downloader);
    println!("  yt-dlp:              {}", cfg.tools.yt_dlp);
    println!("  ffmpeg:              {}", cfg.tools.ffmpeg);
    println!("  Format:              {}", cfg.tools.download.format);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clip_command() {
        let cli = Cli::try_parse_from([
            "hypeclip",
            "clip",
            "https://www.twitch.tv/videos/42",
            "--end",
            "1:30:00",
            "--parallel",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Clip {
                vod_url,
                start,
                end,
                parallel,
                mode,
                output,
            } => {
                assert_eq!(vod_url, "https://www.twitch.tv/videos/42");
                assert_eq!(start, 0);
                assert_eq!(end, 5400);
                assert_eq!(parallel, Some(4));
                assert!(mode.is_none());
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_clip_requires_end() {
        let result = Cli::try_parse_from(["hypeclip", "clip", "https://www.twitch.tv/videos/42"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_timecode() {
        let result = Cli::try_parse_from([
            "hypeclip", "trim", "clip_1.mp4", "--start", "0:xx", "--end", "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_analyze_mode() {
        let cli =
            Cli::try_parse_from(["hypeclip", "analyze", "chat.json", "--mode", "segmented"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Analyze {
                mode: DetectionMode::Segmented,
                ..
            }
        ));
    }

    #[test]
    fn test_trimmed_path() {
        assert_eq!(
            trimmed_path(Path::new("/clips/p/clip_2.mp4")),
            PathBuf::from("/clips/p/clip_2_trimmed.mp4")
        );
    }
}
