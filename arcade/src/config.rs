use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCREEN_WIDTH: u32 = 1024;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 768;
pub const DEFAULT_FPS: u32 = 60;
pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 240;

pub const DEFAULT_RECORDING_FPS: u32 = 30;
pub const MIN_RECORDING_FPS: u32 = 1;
pub const MAX_RECORDING_FPS: u32 = 60;
pub const DEFAULT_QUEUE_CAPACITY: usize = 120;
pub const MIN_QUEUE_CAPACITY: usize = 1;
pub const MAX_QUEUE_CAPACITY: usize = 1024;

pub const DEFAULT_RECORDINGS_DIR: &str = "recordings";
pub const DEFAULT_GAMES_DIR: &str = "games";

/// Root configuration structure. Deserialized from `arcade.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub games: GamesConfig,
}

/// Window size, initial display mode and menu frame rate.
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Windowed-mode width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Windowed-mode height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Start the launcher in fullscreen.
    #[serde(default)]
    pub fullscreen: bool,
    /// Target frames per second for the menu and games. Clamped to [10, 240].
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            fullscreen: false,
            fps: DEFAULT_FPS,
        }
    }
}

impl DisplayConfig {
    pub fn effective_fps(&self) -> u32 {
        self.fps.clamp(MIN_FPS, MAX_FPS)
    }

    /// Windowed size with zero dimensions replaced by the defaults.
    pub fn windowed_size(&self) -> (u32, u32) {
        let w = if self.width == 0 { DEFAULT_SCREEN_WIDTH } else { self.width };
        let h = if self.height == 0 { DEFAULT_SCREEN_HEIGHT } else { self.height };
        (w, h)
    }
}

/// Frame recorder settings.
#[derive(Debug, Deserialize, Clone)]
pub struct RecordingConfig {
    /// Directory under which `gameplay_<timestamp>` session directories are created.
    #[serde(default = "default_recordings_dir")]
    pub output_dir: PathBuf,
    /// Frames per second written to disk. Clamped to [1, 60].
    #[serde(default = "default_recording_fps")]
    pub fps: u32,
    /// Frames that may wait for the writer before new captures are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_RECORDINGS_DIR),
            fps: DEFAULT_RECORDING_FPS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RecordingConfig {
    pub fn effective_fps(&self) -> u32 {
        self.fps.clamp(MIN_RECORDING_FPS, MAX_RECORDING_FPS)
    }

    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.clamp(MIN_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY)
    }
}

/// Where game directories are discovered.
#[derive(Debug, Deserialize, Clone)]
pub struct GamesConfig {
    #[serde(default = "default_games_dir")]
    pub dir: PathBuf,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_GAMES_DIR),
        }
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn default_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RECORDINGS_DIR)
}

fn default_recording_fps() -> u32 {
    DEFAULT_RECORDING_FPS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_games_dir() -> PathBuf {
    PathBuf::from(DEFAULT_GAMES_DIR)
}
