//! Canonical file and directory names shared by the launcher, the registry
//! and the recorder.
//!
//! Input layout:   `<games_dir>/<id>/game.toml`
//!                 `<games_dir>/<id>/assets/images/thumbnail.<ext>`
//! Output layout:  `<recordings_dir>/gameplay_YYYYMMDD_HHMMSS/frame_000000.png`
//!                 `<recordings_dir>/gameplay_YYYYMMDD_HHMMSS/viewer.html`
//!                 `<recordings_dir>/gameplay_YYYYMMDD_HHMMSS/session.toml`
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "arcade.toml";
pub const CONFIG_ENV_VAR: &str = "ARCADE_CONFIG";
pub const MANIFEST_FILE_NAME: &str = "game.toml";
pub const VIEWER_FILE_NAME: &str = "viewer.html";
pub const SUMMARY_FILE_NAME: &str = "session.toml";
pub const SESSION_DIR_PREFIX: &str = "gameplay_";
pub const FRAME_FILE_PREFIX: &str = "frame_";
pub const FRAME_FILE_EXT: &str = "png";
/// Zero-padding width of frame indices. The viewer page pads with the same width.
pub const FRAME_INDEX_DIGITS: usize = 6;

const THUMBNAIL_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Returns the config file path: `$ARCADE_CONFIG` if set, else `./arcade.toml`.
pub fn config_file_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Returns `<game_dir>/game.toml`.
pub fn manifest_path(game_dir: &Path) -> PathBuf {
    game_dir.join(MANIFEST_FILE_NAME)
}

/// Returns the first existing `assets/images/thumbnail.<ext>` under `game_dir`.
pub fn find_thumbnail(game_dir: &Path) -> Option<PathBuf> {
    let images = game_dir.join("assets").join("images");
    THUMBNAIL_EXTENSIONS
        .iter()
        .map(|ext| images.join(format!("thumbnail.{ext}")))
        .find(|p| p.is_file())
}

/// Session directory name for a recording started at `started_at`.
/// Second granularity: two sessions started in the same second share a name.
pub fn session_dir_name<Tz: TimeZone>(started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{SESSION_DIR_PREFIX}{}", started_at.format("%Y%m%d_%H%M%S"))
}

/// File name of the frame persisted at `index`: `frame_000042.png`.
pub fn frame_file_name(index: u64) -> String {
    format!(
        "{FRAME_FILE_PREFIX}{index:0width$}.{FRAME_FILE_EXT}",
        width = FRAME_INDEX_DIGITS
    )
}
