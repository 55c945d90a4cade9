//! Bounded-concurrency clip pipeline.
//!
//! Each valid window becomes a [`ClipJob`] that downloads its media segment
//! into a job-local temporary file, re-encodes it into the finished clip and
//! removes the temporary file. All jobs are spawned up front; a semaphore
//! keeps at most `max_parallel` of them working at once. One job failing
//! never fails the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::progress::ProgressSink;
use crate::adapters::{MediaFetcher, Transcoder, VodSource};
use crate::domain::{ClipJob, ClipWindow, JobState};
use crate::error::JobError;

/// Pipeline settings as they appear in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum jobs downloading or transcoding at once (default: 10)
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Per-job deadline in seconds; no deadline when unset
    #[serde(default)]
    pub job_timeout_seconds: Option<u64>,
}

fn default_max_parallel() -> usize {
    10
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            job_timeout_seconds: None,
        }
    }
}

impl PipelineSettings {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_seconds.map(Duration::from_secs)
    }
}

/// A clip that was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipOutput {
    pub index: usize,
    pub window: ClipWindow,
    pub path: PathBuf,
    pub duration_ms: u64,
}

/// A job that ended without a clip
#[derive(Debug)]
pub struct ClipFailure {
    pub index: usize,
    pub window: ClipWindow,
    pub error: JobError,
}

/// A window that was never submitted because it has no positive length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedWindow {
    pub index: usize,
    pub window: ClipWindow,
}

/// Everything a batch produced, in submission order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<ClipOutput>,
    pub failures: Vec<ClipFailure>,
    pub skipped: Vec<SkippedWindow>,
}

impl BatchReport {
    /// Jobs that were actually run
    pub fn submitted(&self) -> usize {
        self.outputs.len() + self.failures.len()
    }

    pub fn produced(&self) -> usize {
        self.outputs.len()
    }

    /// At least one job ran and none succeeded
    pub fn is_total_failure(&self) -> bool {
        self.submitted() > 0 && self.outputs.is_empty()
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.outputs.iter().map(|o| o.path.as_path()).collect()
    }

    /// e.g. "3 of 4 clips produced"
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} of {} clips produced",
            self.produced(),
            self.submitted()
        );
        if !self.skipped.is_empty() {
            summary.push_str(&format!(" ({} skipped)", self.skipped.len()));
        }
        summary
    }
}

/// Finished clip path for a job index
pub fn output_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("clip_{}.mp4", index + 1))
}

/// Download target for a job index
pub fn temp_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("temp_clip{}.mp4", index + 1))
}

/// Removes the downloaded segment when dropped
struct TempClip {
    path: PathBuf,
}

impl TempClip {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a segment left behind by an earlier, interrupted run
    async fn clear_stale(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for TempClip {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temporary clip"),
        }
    }
}

/// State shared by every job of a batch
struct BatchContext {
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Arc<dyn Transcoder>,
    progress: Arc<dyn ProgressSink>,
    source: VodSource,
    output_dir: PathBuf,
    job_timeout: Option<Duration>,
    slots: Arc<Semaphore>,
}

/// Runs clip jobs for a batch of windows
pub struct ClipPipeline {
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Arc<dyn Transcoder>,
    progress: Arc<dyn ProgressSink>,
    settings: PipelineSettings,
}

impl ClipPipeline {
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        transcoder: Arc<dyn Transcoder>,
        progress: Arc<dyn ProgressSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            progress,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Clip every valid window into `output_dir`.
    ///
    /// Waits for all jobs. Only setting up the output directory can fail;
    /// job errors are collected in the report.
    #[instrument(skip(self, source, windows, cancel), fields(vod = %source.url, windows = windows.len()))]
    pub async fn run(
        &self,
        source: &VodSource,
        windows: &[ClipWindow],
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> std::io::Result<BatchReport> {
        tokio::fs::create_dir_all(output_dir).await?;

        let context = Arc::new(BatchContext {
            fetcher: self.fetcher.clone(),
            transcoder: self.transcoder.clone(),
            progress: self.progress.clone(),
            source: source.clone(),
            output_dir: output_dir.to_path_buf(),
            job_timeout: self.settings.job_timeout(),
            slots: Arc::new(Semaphore::new(self.settings.max_parallel.max(1))),
        });

        let mut report = BatchReport::default();
        let mut handles = Vec::new();

        self.progress.report("Clipping hype moments...");

        for (index, window) in windows.iter().copied().enumerate() {
            if !window.is_valid() {
                warn!(index, start = window.start, end = window.end, "Skipping clip: invalid range");
                report.skipped.push(SkippedWindow { index, window });
                continue;
            }

            let job = ClipJob::new(index, window);
            let handle = tokio::spawn(run_job(context.clone(), job, cancel.child_token()));
            handles.push((index, window, handle));
        }

        for (index, window, handle) in handles {
            match handle.await {
                Ok(Ok(output)) => report.outputs.push(output),
                Ok(Err(error)) => report.failures.push(ClipFailure {
                    index,
                    window,
                    error,
                }),
                Err(join_error) => {
                    error!(index, error = %join_error, "Clip task aborted");
                    report.failures.push(ClipFailure {
                        index,
                        window,
                        error: JobError::Aborted(join_error.to_string()),
                    });
                }
            }
        }

        info!(
            produced = report.produced(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "Clip batch finished"
        );

        Ok(report)
    }
}

async fn run_job(
    context: Arc<BatchContext>,
    mut job: ClipJob,
    cancel: CancellationToken,
) -> Result<ClipOutput, JobError> {
    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            job.advance(JobState::Cancelled)?;
            return Err(JobError::Cancelled);
        }
        permit = context.slots.clone().acquire_owned() => {
            permit.map_err(|e| JobError::Aborted(e.to_string()))?
        }
    };
    let _permit = permit;

    let started = Instant::now();
    let work = with_deadline(context.job_timeout, process(&context, &mut job));
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled),
        result = work => result,
    };

    match result {
        Ok(path) => Ok(ClipOutput {
            index: job.index,
            window: job.window,
            path,
            duration_ms: started.elapsed().as_millis() as u64,
        }),
        Err(error) => {
            let terminal = match error {
                JobError::Cancelled => JobState::Cancelled,
                _ => JobState::Failed,
            };
            if !job.state().is_terminal() {
                if let Err(e) = job.advance(terminal) {
                    warn!(error = %e, "Could not record job failure");
                }
            }

            error!(
                index = job.index,
                start = job.window.start,
                end = job.window.end,
                error = %error,
                "Clip failed"
            );
            context
                .progress
                .report(&format!("Clip {} failed.", job.number()));
            Err(error)
        }
    }
}

async fn with_deadline<F>(deadline: Option<Duration>, work: F) -> Result<PathBuf, JobError>
where
    F: std::future::Future<Output = Result<PathBuf, JobError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(JobError::TimedOut(limit))),
        None => work.await,
    }
}

/// Acquire → transcode → cleanup for one job
async fn process(context: &BatchContext, job: &mut ClipJob) -> Result<PathBuf, JobError> {
    let number = job.number();
    let window = job.window;

    job.advance(JobState::Acquiring)?;
    info!(index = job.index, start = window.start, end = window.end, "Downloading clip");
    context
        .progress
        .report(&format!("Downloading clip {}...", number));

    let temp = TempClip::new(temp_path(&context.output_dir, job.index));
    temp.clear_stale().await?;
    context
        .fetcher
        .fetch(&context.source, window, temp.path())
        .await
        .map_err(JobError::Acquisition)?;

    job.advance(JobState::Transcoding)?;
    context
        .progress
        .report(&format!("Clip {} downloaded. Processing...", number));

    let output = output_path(&context.output_dir, job.index);
    context
        .transcoder
        .transcode(temp.path(), &output)
        .await
        .map_err(JobError::Transcode)?;
    drop(temp);

    job.advance(JobState::Done)?;
    context
        .progress
        .report(&format!("Clip {} processed successfully.", number));

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let dir = Path::new("/clips/p1");
        assert_eq!(output_path(dir, 0), PathBuf::from("/clips/p1/clip_1.mp4"));
        assert_eq!(temp_path(dir, 3), PathBuf::from("/clips/p1/temp_clip4.mp4"));
    }

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.max_parallel, 10);
        assert!(settings.job_timeout().is_none());
    }

    #[test]
    fn test_report_summary() {
        let window = ClipWindow::new(0, 30);
        let report = BatchReport {
            outputs: vec![ClipOutput {
                index: 0,
                window,
                path: PathBuf::from("clip_1.mp4"),
                duration_ms: 10,
            }],
            failures: vec![ClipFailure {
                index: 1,
                window,
                error: JobError::Cancelled,
            }],
            skipped: vec![SkippedWindow {
                index: 2,
                window: ClipWindow::new(5, 5),
            }],
        };
        assert_eq!(report.summary(), "1 of 2 clips produced (1 skipped)");
        assert!(!report.is_total_failure());
        assert_eq!(report.paths(), vec![Path::new("clip_1.mp4")]);
    }

    #[test]
    fn test_empty_report_is_not_total_failure() {
        let report = BatchReport::default();
        assert!(!report.is_total_failure());
        assert_eq!(report.summary(), "0 of 0 clips produced");
    }

    #[test]
    fn test_temp_clip_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("temp_clip1.mp4");
        std::fs::write(&path, b"partial").unwrap();

        drop(TempClip::new(path.clone()));
        assert!(!path.exists());

        // Never-written file is fine too
        drop(TempClip::new(dir.path().join("temp_clip2.mp4")));
    }

    #[tokio::test]
    async fn test_clear_stale_temp_clip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("temp_clip1.mp4");
        std::fs::write(&path, b"left over").unwrap();

        let temp = TempClip::new(path.clone());
        temp.clear_stale().await.unwrap();
        assert!(!path.exists());

        // Nothing to clear is fine
        temp.clear_stale().await.unwrap();
    }
}
