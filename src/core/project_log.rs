//! Append-only project log with file-based persistence.
//!
//! Each project gets a directory holding `events.jsonl`, one JSON event per
//! line, so a project's history can be inspected with any text tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::{Event, EventType, Project};

/// File-based event log for one project
pub struct ProjectLog {
    project_id: Uuid,

    /// Directory containing the project
    project_dir: PathBuf,

    /// Path to the events.jsonl file
    events_path: PathBuf,
}

impl ProjectLog {
    /// Create or open the log for a project under the configured projects dir
    pub async fn open(project_id: Uuid) -> Result<Self> {
        Self::open_in(&Self::base_directory()?, project_id).await
    }

    /// Create or open the log for a project under `base_dir`
    pub async fn open_in(base_dir: &Path, project_id: Uuid) -> Result<Self> {
        let project_dir = base_dir.join(project_id.to_string());

        fs::create_dir_all(&project_dir).await.with_context(|| {
            format!(
                "Failed to create project directory: {}",
                project_dir.display()
            )
        })?;

        let events_path = project_dir.join("events.jsonl");

        Ok(Self {
            project_id,
            project_dir,
            events_path,
        })
    }

    /// Start a new project and record it as queued
    pub async fn create_in(base_dir: &Path, vod_url: &str) -> Result<Self> {
        let log = Self::open_in(base_dir, Uuid::new_v4()).await?;
        log.append(&Event::new(log.project_id, EventType::ProjectQueued, vod_url))
            .await?;
        Ok(log)
    }

    /// Get the base directory for all projects (~/.hypeclip/projects or $HYPECLIP_HOME/projects)
    pub fn base_directory() -> Result<PathBuf> {
        crate::config::projects_dir()
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Append an event to the log
    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open events file: {}",
                    self.events_path.display()
                )
            })?;

        let json = serde_json::to_string(event).context("Failed to serialize event")?;
        file.write_all(format!("{}\n", json).as_bytes())
            .await
            .context("Failed to write event")?;
        file.flush().await.context("Failed to flush event")?;

        Ok(())
    }

    /// Replay all events in order
    pub async fn replay(&self) -> Result<Vec<Event>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut events = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse event: {}", line))?;
            events.push(event);
        }

        Ok(events)
    }

    /// Current project state, or `None` if nothing was logged yet
    pub async fn project(&self) -> Result<Option<Project>> {
        let events = self.replay().await?;
        Ok(Project::from_events(&events))
    }

    /// List all project IDs in `base_dir`
    pub async fn list_projects_in(base_dir: &Path) -> Result<Vec<Uuid>> {
        if !base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        let mut entries = fs::read_dir(base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(uuid) = Uuid::parse_str(name) {
                        projects.push(uuid);
                    }
                }
            }
        }

        Ok(projects)
    }

    /// Load every project under `base_dir`, newest first
    pub async fn load_projects_in(base_dir: &Path, limit: usize) -> Result<Vec<Project>> {
        let mut projects = Vec::new();

        for id in Self::list_projects_in(base_dir).await? {
            let log = Self::open_in(base_dir, id).await?;
            if let Ok(Some(project)) = log.project().await {
                projects.push(project);
            }
        }

        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        projects.truncate(limit);

        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClipWindow, ProjectState};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_and_replay() {
        let temp = TempDir::new().unwrap();
        let log = ProjectLog::create_in(temp.path(), "https://www.twitch.tv/videos/1")
            .await
            .unwrap();
        let id = log.project_id();

        log.append(&Event::new(id, EventType::ProjectProcessing, "processing"))
            .await
            .unwrap();

        let events = log.replay().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::ProjectQueued);
        assert_eq!(events[1].event_type, EventType::ProjectProcessing);
        assert!(log.events_path().starts_with(temp.path()));
    }

    #[tokio::test]
    async fn test_project_replay() {
        let temp = TempDir::new().unwrap();
        let log = ProjectLog::create_in(temp.path(), "url").await.unwrap();
        let id = log.project_id();

        log.append(
            &Event::new(id, EventType::ClipCompleted, "Clip 1 produced").with_clip(
                0,
                ClipWindow::new(85, 115),
                Some(PathBuf::from("clip_1.mp4")),
            ),
        )
        .await
        .unwrap();
        log.append(&Event::new(id, EventType::ProjectCompleted, "1 of 1 clips produced"))
            .await
            .unwrap();

        let project = log.project().await.unwrap().unwrap();
        assert_eq!(project.id, id);
        assert_eq!(project.state, ProjectState::Completed);
        assert_eq!(project.clips.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_log() {
        let temp = TempDir::new().unwrap();
        let log = ProjectLog::open_in(temp.path(), Uuid::new_v4()).await.unwrap();
        assert!(log.replay().await.unwrap().is_empty());
        assert!(log.project().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_projects_ignores_strays() {
        let temp = TempDir::new().unwrap();
        let a = ProjectLog::create_in(temp.path(), "a").await.unwrap();
        let b = ProjectLog::create_in(temp.path(), "b").await.unwrap();
        std::fs::create_dir_all(temp.path().join("not-a-uuid")).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let mut ids = ProjectLog::list_projects_in(temp.path()).await.unwrap();
        ids.sort();
        let mut expected = vec![a.project_id(), b.project_id()];
        expected.sort();
        assert_eq!(ids, expected);

        let projects = ProjectLog::load_projects_in(temp.path(), 1).await.unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_base_dir() {
        let temp = TempDir::new().unwrap();
        let ids = ProjectLog::list_projects_in(&temp.path().join("nope"))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }
}
