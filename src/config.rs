//! Configuration for hypeclip.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (HYPECLIP_HOME, HYPECLIP_CLIPS_DIR)
//! 2. Config file (.hypeclip/config.yaml)
//! 3. Defaults (~/.hypeclip, ~/.hypeclip/clips)
//!
//! Config file discovery:
//! - Searches current directory and parents for .hypeclip/config.yaml
//! - `paths.home` is relative to the .hypeclip/ directory
//! - `paths.clips` is relative to the directory containing .hypeclip/

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::ffmpeg::FfmpegSettings;
use crate::adapters::ytdlp::YtDlpSettings;
use crate::analysis::{DetectionMode, DetectionParams, WindowParams};
use crate::core::pipeline::PipelineSettings;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub detection: Option<DetectionConfig>,
    #[serde(default)]
    pub windows: Option<WindowParams>,
    #[serde(default)]
    pub pipeline: Option<PipelineSettings>,
    #[serde(default)]
    pub tools: Option<ToolsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .hypeclip/)
    pub home: Option<String>,
    /// Output directory for clips (relative to the project root)
    pub clips: Option<String>,
}

/// Detection section: parameters plus the mode
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub mode: DetectionMode,
    #[serde(flatten)]
    pub params: DetectionParams,
}

/// External tool locations and settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_twitch_downloader")]
    pub twitch_downloader: String,
    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default)]
    pub download: YtDlpSettings,
    #[serde(default)]
    pub encode: FfmpegSettings,
}

fn default_twitch_downloader() -> String {
    "TwitchDownloaderCLI".to_string()
}
fn default_yt_dlp() -> String {
    "yt-dlp".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            twitch_downloader: default_twitch_downloader(),
            yt_dlp: default_yt_dlp(),
            ffmpeg: default_ffmpeg(),
            download: YtDlpSettings::default(),
            encode: FfmpegSettings::default(),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory (project logs)
    pub home: PathBuf,
    /// Root directory for produced clips
    pub clips_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub detection_mode: DetectionMode,
    pub detection: DetectionParams,
    pub windows: WindowParams,
    pub pipeline: PipelineSettings,
    pub tools: ToolsConfig,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            clips_dir: home.join("clips"),
            home,
            config_file: None,
            detection_mode: DetectionMode::default(),
            detection: DetectionParams::default(),
            windows: WindowParams::default(),
            pipeline: PipelineSettings::default(),
            tools: ToolsConfig::default(),
        }
    }

    /// Directory holding one sub-directory per project log
    pub fn projects_dir(&self) -> PathBuf {
        self.home.join("projects")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".hypeclip").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge defaults, an optional config file and environment overrides
fn resolve(
    default_home: PathBuf,
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let env_home = env("HYPECLIP_HOME").map(PathBuf::from);
    let env_clips = env("HYPECLIP_CLIPS_DIR").map(PathBuf::from);

    let Some((config_path, config)) = file else {
        let home = env_home.unwrap_or(default_home);
        let mut resolved = ResolvedConfig::with_home(home);
        if let Some(clips) = env_clips {
            resolved.clips_dir = clips;
        }
        return resolved;
    };

    // .hypeclip/ and the project root above it
    let hypeclip_dir = config_path.parent().unwrap_or(Path::new("."));
    let base_dir = hypeclip_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(home) = env_home {
        home
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(hypeclip_dir, home_path)
    } else {
        default_home
    };

    let clips_dir = if let Some(clips) = env_clips {
        clips
    } else if let Some(ref clips_path) = config.paths.clips {
        resolve_path(base_dir, clips_path)
    } else {
        home.join("clips")
    };

    let (detection_mode, detection) = config
        .detection
        .map(|d| (d.mode, d.params))
        .unwrap_or_default();

    ResolvedConfig {
        home,
        clips_dir,
        config_file: Some(config_path),
        detection_mode,
        detection,
        windows: config.windows.unwrap_or_default(),
        pipeline: config.pipeline.unwrap_or_default(),
        tools: config.tools.unwrap_or_default(),
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".hypeclip");

    let file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(default_home, file, |key| std::env::var(key).ok()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the projects directory ($HYPECLIP_HOME/projects)
pub fn projects_dir() -> Result<PathBuf> {
    Ok(config()?.projects_dir())
}
