use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// What one recording session produced. Written next to the frames as
/// `session.toml` when the session stops.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecordingSummary {
    /// Launcher version that made the recording.
    pub version: String,
    pub session_dir: PathBuf,
    /// RFC 3339 local time the session started.
    pub started_at: String,
    /// RFC 3339 local time the writer finished.
    pub stopped_at: String,
    /// Size requested at start. Frames keep the size they were rendered at.
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    /// Frames on disk, numbered `0..frames_written`.
    pub frames_written: u64,
    /// Frames the writer could not persist.
    pub frames_failed: u64,
    /// Frames rejected at capture because the queue was full.
    pub frames_dropped: u64,
    /// Absent when no frames were written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<PathBuf>,
}

/// Serializes `summary` to TOML and writes it to `path`.
/// Errors are logged, never returned: losing the summary must not lose the
/// recording.
pub fn write_summary(path: &Path, summary: &RecordingSummary) {
    match toml::to_string_pretty(summary) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!(target: "recorder", "Failed to write session summary {}: {e}", path.display());
            }
        }
        Err(e) => warn!(target: "recorder", "Failed to serialize session summary: {e}"),
    }
}
