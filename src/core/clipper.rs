//! Request-level orchestration.
//!
//! Coordinates transcript download, chat analysis, the clip pipeline and
//! project log events for one clipping request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::pipeline::{BatchReport, ClipPipeline, PipelineSettings};
use super::progress::ProgressSink;
use super::project_log::ProjectLog;
use crate::adapters::{MediaFetcher, Transcoder, TranscriptFetcher, VodSource};
use crate::analysis::{analyze, Analysis, DetectionMode, DetectionParams, WindowParams};
use crate::domain::{ClipWindow, Event, EventType};

/// One clipping request: a recording and the part of it to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub vod_url: String,
    pub start: u64,
    pub end: u64,
    /// Write clips here instead of `<clips_dir>/<project_id>/`
    pub output_dir: Option<PathBuf>,
}

impl ClipRequest {
    pub fn new(vod_url: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            vod_url: vod_url.into(),
            start,
            end,
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn range(&self) -> ClipWindow {
        ClipWindow::new(self.start, self.end)
    }
}

/// Everything the clipper needs besides its tools
#[derive(Debug, Clone)]
pub struct ClipperSettings {
    pub mode: DetectionMode,
    pub detection: DetectionParams,
    pub windows: WindowParams,
    pub pipeline: PipelineSettings,
    /// Clips land in `<clips_dir>/<project_id>/`
    pub clips_dir: PathBuf,
}

impl ClipperSettings {
    /// Settings from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Self {
        Self {
            mode: config.detection_mode,
            detection: config.detection,
            windows: config.windows,
            pipeline: config.pipeline.clone(),
            clips_dir: config.clips_dir.clone(),
        }
    }
}

/// Outcome of a finished request
#[derive(Debug)]
pub struct ClipReport {
    pub project_id: Uuid,
    pub analysis: Analysis,
    pub batch: BatchReport,
    pub output_dir: PathBuf,
}

/// Runs clipping requests end to end
pub struct Clipper {
    transcripts: Arc<dyn TranscriptFetcher>,
    pipeline: ClipPipeline,
    progress: Arc<dyn ProgressSink>,
    settings: ClipperSettings,
}

impl Clipper {
    pub fn new(
        transcripts: Arc<dyn TranscriptFetcher>,
        media: Arc<dyn MediaFetcher>,
        transcoder: Arc<dyn Transcoder>,
        progress: Arc<dyn ProgressSink>,
        settings: ClipperSettings,
    ) -> Self {
        let pipeline = ClipPipeline::new(
            media,
            transcoder,
            progress.clone(),
            settings.pipeline.clone(),
        );
        Self {
            transcripts,
            pipeline,
            progress,
            settings,
        }
    }

    pub fn settings(&self) -> &ClipperSettings {
        &self.settings
    }

    /// Run a request, recording its lifecycle in `log`.
    ///
    /// Transcript and analysis errors fail the project. Individual clip
    /// failures do not; the project completes with whatever was produced.
    #[instrument(skip(self, log, cancel), fields(project_id = %log.project_id(), vod = %request.vod_url))]
    pub async fn run(
        &self,
        request: &ClipRequest,
        log: &ProjectLog,
        cancel: &CancellationToken,
    ) -> Result<ClipReport> {
        let project_id = log.project_id();
        info!("Starting clip request");

        log.append(&Event::new(
            project_id,
            EventType::ProjectProcessing,
            "Processing",
        ))
        .await?;

        let analysis = match self.find_moments(request).await {
            Ok(analysis) => analysis,
            Err(e) => return self.fail(log, e).await,
        };

        self.progress
            .report("Hype moments found. Preparing clips...");

        let output_dir = request
            .output_dir
            .clone()
            .unwrap_or_else(|| self.settings.clips_dir.join(project_id.to_string()));
        let source = VodSource::new(&request.vod_url);
        let batch = match self
            .pipeline
            .run(&source, &analysis.windows, &output_dir, cancel)
            .await
            .with_context(|| format!("Failed to prepare {}", output_dir.display()))
        {
            Ok(batch) => batch,
            Err(e) => return self.fail(log, e).await,
        };

        self.record_batch(log, &batch).await?;

        let summary = batch.summary();
        log.append(&Event::new(project_id, EventType::ProjectCompleted, &summary))
            .await?;

        if batch.is_total_failure() {
            warn!(%summary, "No clips produced");
            self.progress.report("No clips could be produced.");
        } else {
            self.progress.report("Clips generated successfully.");
        }
        info!(%summary, "Clip request finished");

        Ok(ClipReport {
            project_id,
            analysis,
            batch,
            output_dir,
        })
    }

    async fn find_moments(&self, request: &ClipRequest) -> Result<Analysis> {
        let range = request.range();
        if !range.is_valid() {
            anyhow::bail!("Invalid range {}", range);
        }

        self.progress.report("Downloading vod data...");
        let source = VodSource::new(&request.vod_url);
        let transcript = self
            .transcripts
            .fetch_transcript(&source, range)
            .await
            .context("Failed to download chat transcript")?;

        self.progress.report("Finding hype moments...");
        let analysis = analyze(
            &transcript.events,
            self.settings.mode,
            &self.settings.detection,
            &self.settings.windows,
        )
        .context("Failed to analyze chat")?;

        Ok(analysis)
    }

    async fn record_batch(&self, log: &ProjectLog, batch: &BatchReport) -> Result<()> {
        let project_id = log.project_id();

        for output in &batch.outputs {
            let event = Event::new(
                project_id,
                EventType::ClipCompleted,
                format!("Clip {} produced", output.index + 1),
            )
            .with_clip(output.index, output.window, Some(output.path.clone()))
            .with_duration(output.duration_ms);
            log.append(&event).await?;
        }

        for failure in &batch.failures {
            let event = Event::new(
                project_id,
                EventType::ClipFailed,
                format!("Clip {} failed", failure.index + 1),
            )
            .with_clip(failure.index, failure.window, None)
            .with_error(failure.error.to_string());
            log.append(&event).await?;
        }

        for skipped in &batch.skipped {
            let event = Event::new(
                project_id,
                EventType::ClipSkipped,
                format!("Clip {} skipped", skipped.index + 1),
            )
            .with_clip(skipped.index, skipped.window, None);
            log.append(&event).await?;
        }

        Ok(())
    }

    async fn fail(&self, log: &ProjectLog, error: anyhow::Error) -> Result<ClipReport> {
        let message = format!("{:#}", error);
        error!(error = %message, "Clip request failed");

        self.progress.report(&format!("Failed: {}", message));
        log.append(
            &Event::new(log.project_id(), EventType::ProjectFailed, "Failed")
                .with_error(&message),
        )
        .await?;

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_range() {
        let request = ClipRequest::new("https://www.twitch.tv/videos/1", 60, 3600);
        assert_eq!(request.range(), ClipWindow::new(60, 3600));
        assert!(request.range().is_valid());
        assert!(!ClipRequest::new("u", 10, 10).range().is_valid());
    }

    #[test]
    fn test_settings_from_config() {
        let config = crate::config::ResolvedConfig::with_home(PathBuf::from("/tmp/hc"));
        let settings = ClipperSettings::from_config(&config);
        assert_eq!(settings.clips_dir, PathBuf::from("/tmp/hc/clips"));
        assert_eq!(settings.mode, DetectionMode::Hybrid);
        assert_eq!(settings.pipeline.max_parallel, 10);
    }
}
