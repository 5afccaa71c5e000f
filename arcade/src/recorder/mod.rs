//! Gameplay frame recorder.
//!
//! The render loop is the only producer: once per frame it offers the canvas
//! to [`Recorder::capture_frame`], which rate-limits to the target FPS and
//! queues an owned snapshot without ever blocking. One writer thread per
//! session drains the queue to `frame_NNNNNN.png` files. Stopping drains the
//! queue completely, then writes `viewer.html` and `session.toml`.
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::canvas::Canvas;
use crate::clock;
use crate::config::RecordingConfig;
use crate::paths;

pub mod summary;
pub mod viewer;
mod writer;

pub use summary::RecordingSummary;
use writer::{CapturedFrame, WriterStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    /// `stop` is waiting for the writer to flush the queue.
    Draining,
}

/// What happened to a frame offered to [`Recorder::capture_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Queued for the writer with this sequence number.
    Queued(u64),
    /// Arrived sooner than one frame interval after the last queued frame.
    Throttled,
    /// No session, or the session is paused.
    Inactive,
    /// The writer is behind and the queue is full; the frame was dropped.
    QueueFull,
    /// The writer thread has exited; `stop` will report why.
    WriterGone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub dir: PathBuf,
    pub started_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Parent of the per-session directories.
    pub output_dir: PathBuf,
    pub fps: u32,
    pub queue_capacity: usize,
}

impl From<&RecordingConfig> for RecorderConfig {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            fps: config.effective_fps(),
            queue_capacity: config.effective_queue_capacity(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::from(&RecordingConfig::default())
    }
}

struct Session {
    handle: SessionHandle,
    size: (u32, u32),
    frame_tx: mpsc::Sender<CapturedFrame>,
    stop_tx: watch::Sender<bool>,
    worker: JoinHandle<Result<WriterStats>>,
    /// Frames persisted so far, updated by the writer.
    written: Arc<AtomicU64>,
    next_seq: u64,
    dropped: u64,
    last_capture: Option<Instant>,
}

pub struct Recorder {
    config: RecorderConfig,
    frame_interval: Duration,
    state: RecorderState,
    session: Option<Session>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            frame_interval: clock::frame_duration(config.fps),
            config,
            state: RecorderState::Idle,
            session: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// True while a session is open, paused or not.
    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == RecorderState::Paused
    }

    /// Frames persisted by the current session's writer so far.
    pub fn frame_count(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |s| s.written.load(Ordering::Acquire))
    }

    /// Opens a new session in a fresh `gameplay_<timestamp>` directory and
    /// starts its writer. Returns the running session if there already is one.
    pub fn start(&mut self, width: u32, height: u32) -> Result<SessionHandle> {
        self.start_with(width, height, writer::spawn)
    }

    /// [`start`](Self::start) with the writer thread supplied by `spawn_writer`.
    fn start_with<F>(&mut self, width: u32, height: u32, spawn_writer: F) -> Result<SessionHandle>
    where
        F: FnOnce(
            PathBuf,
            mpsc::Receiver<CapturedFrame>,
            watch::Receiver<bool>,
            Arc<AtomicU64>,
        ) -> Result<JoinHandle<Result<WriterStats>>>,
    {
        if let Some(session) = &self.session {
            debug!(target: "recorder", "Already recording to {}", session.handle.dir.display());
            return Ok(session.handle.clone());
        }

        let started_at = Local::now();
        let dir = self.config.output_dir.join(paths::session_dir_name(&started_at));
        if dir.exists() {
            warn!(
                target: "recorder",
                "Session directory {} already exists; existing frames may be overwritten",
                dir.display()
            );
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;

        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (stop_tx, stop_rx) = watch::channel(false);
        let written = Arc::new(AtomicU64::new(0));
        let worker = spawn_writer(dir.clone(), frame_rx, stop_rx, Arc::clone(&written))?;

        let handle = SessionHandle { dir, started_at };
        self.session = Some(Session {
            handle: handle.clone(),
            size: (width, height),
            frame_tx,
            stop_tx,
            worker,
            written,
            next_seq: 0,
            dropped: 0,
            last_capture: None,
        });
        self.state = RecorderState::Recording;
        info!(target: "recorder", "Recording started: {}", handle.dir.display());
        Ok(handle)
    }

    /// Flips between recording and paused. Does nothing without a session.
    pub fn toggle_pause(&mut self) -> RecorderState {
        self.state = match self.state {
            RecorderState::Recording => RecorderState::Paused,
            RecorderState::Paused => RecorderState::Recording,
            other => return other,
        };
        info!(
            target: "recorder",
            "Recording {}",
            if self.is_paused() { "paused" } else { "resumed" }
        );
        self.state
    }

    pub fn capture_frame(&mut self, canvas: &Canvas) -> CaptureOutcome {
        self.capture_frame_at(canvas, Instant::now())
    }

    /// [`capture_frame`](Self::capture_frame) with the clock reading supplied
    /// by the caller.
    pub fn capture_frame_at(&mut self, canvas: &Canvas, now: Instant) -> CaptureOutcome {
        if self.state != RecorderState::Recording {
            return CaptureOutcome::Inactive;
        }
        let Some(session) = self.session.as_mut() else {
            return CaptureOutcome::Inactive;
        };
        if let Some(last) = session.last_capture {
            if now.saturating_duration_since(last) < self.frame_interval {
                return CaptureOutcome::Throttled;
            }
        }

        let seq = session.next_seq;
        let frame = CapturedFrame {
            seq,
            image: canvas.snapshot(),
        };
        match session.frame_tx.try_send(frame) {
            Ok(()) => {
                session.next_seq += 1;
                session.last_capture = Some(now);
                CaptureOutcome::Queued(seq)
            }
            Err(TrySendError::Full(_)) => {
                session.dropped += 1;
                if session.dropped == 1 {
                    warn!(target: "recorder", "Frame writer is falling behind; dropping frames");
                }
                CaptureOutcome::QueueFull
            }
            Err(TrySendError::Closed(_)) => CaptureOutcome::WriterGone,
        }
    }

    /// Ends the session: waits for every queued frame to be written, then
    /// writes the viewer (when at least one frame exists) and the summary.
    /// Returns `None` when no session was open, and an error when the writer
    /// thread failed.
    pub fn stop(&mut self) -> Result<Option<RecordingSummary>> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        self.state = RecorderState::Draining;
        let Session {
            handle,
            size,
            frame_tx,
            stop_tx,
            worker,
            dropped,
            ..
        } = session;

        // The writer sees the flag on its next empty poll, drains what is
        // left and exits; the queue stays open until then.
        let _ = stop_tx.send(true);
        let joined = worker.join();
        drop(frame_tx);
        self.state = RecorderState::Idle;

        let stats = match joined {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                error!(target: "recorder", "Frame writer failed: {e:#}");
                return Err(e.context("Frame writer failed"));
            }
            Err(_) => {
                error!(target: "recorder", "Frame writer thread panicked");
                anyhow::bail!("Frame writer thread panicked");
            }
        };

        let viewer = if stats.written > 0 {
            match viewer::write(&handle.dir, stats.written, self.config.fps) {
                Ok(path) => {
                    info!(target: "recorder", "HTML viewer created: {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    warn!(target: "recorder", "{e:#}");
                    None
                }
            }
        } else {
            info!(target: "recorder", "No frames captured; skipping viewer");
            None
        };

        let summary = RecordingSummary {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session_dir: handle.dir.clone(),
            started_at: handle.started_at.to_rfc3339(),
            stopped_at: Local::now().to_rfc3339(),
            width: size.0,
            height: size.1,
            target_fps: self.config.fps,
            frames_written: stats.written,
            frames_failed: stats.failed,
            frames_dropped: dropped,
            viewer,
        };
        summary::write_summary(&handle.dir.join(paths::SUMMARY_FILE_NAME), &summary);

        info!(
            target: "recorder",
            "Recording stopped. {} frames saved to {}",
            stats.written,
            handle.dir.display()
        );
        Ok(Some(summary))
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop() {
                error!(target: "recorder", "{e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::rgb;
    use std::path::Path;

    fn recorder(dir: &Path, fps: u32) -> Recorder {
        Recorder::new(RecorderConfig {
            output_dir: dir.to_path_buf(),
            fps,
            queue_capacity: 256,
        })
    }

    fn canvas() -> Canvas {
        let mut c = Canvas::new(8, 6);
        c.fill(rgb(10, 20, 30));
        c
    }

    fn frame_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(paths::FRAME_FILE_PREFIX))
            .collect();
        names.sort();
        names
    }

    /// Offers `n` frames spaced one second apart so none is throttled.
    fn capture_spaced(rec: &mut Recorder, n: u64) -> Vec<CaptureOutcome> {
        let base = Instant::now();
        let c = canvas();
        (0..n)
            .map(|i| rec.capture_frame_at(&c, base + Duration::from_secs(i)))
            .collect()
    }

    // ── lifecycle ─────────────────────────────────────────────────────────────

    #[test]
    fn starts_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(rec.capture_frame(&canvas()), CaptureOutcome::Inactive);
        assert_eq!(rec.toggle_pause(), RecorderState::Idle);
        assert!(rec.stop().unwrap().is_none());
    }

    #[test]
    fn start_creates_session_dir_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let first = rec.start(640, 480).unwrap();
        assert!(first.dir.is_dir());
        assert!(first
            .dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(paths::SESSION_DIR_PREFIX));
        assert_eq!(rec.state(), RecorderState::Recording);

        let second = rec.start(640, 480).unwrap();
        assert_eq!(first, second);
        rec.stop().unwrap();
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[test]
    fn start_fails_when_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("recordings");
        std::fs::write(&blocker, b"").unwrap();
        let mut rec = recorder(&blocker, 30);
        assert!(rec.start(10, 10).is_err());
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    // ── capture + stop ────────────────────────────────────────────────────────

    #[test]
    fn n_frames_give_n_files_and_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let session = rec.start(8, 6).unwrap();

        let outcomes = capture_spaced(&mut rec, 7);
        let expected: Vec<CaptureOutcome> = (0..7).map(CaptureOutcome::Queued).collect();
        assert_eq!(outcomes, expected);

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 7);
        assert_eq!(summary.frames_failed, 0);
        assert_eq!(summary.frames_dropped, 0);
        let names: Vec<String> = (0..7).map(paths::frame_file_name).collect();
        assert_eq!(frame_files(&session.dir), names);

        let viewer = std::fs::read_to_string(session.dir.join(paths::VIEWER_FILE_NAME)).unwrap();
        assert!(viewer.contains("const totalFrames = 7;"));
        assert!(viewer.contains("const fps = 30;"));
        assert_eq!(summary.viewer, Some(session.dir.join(paths::VIEWER_FILE_NAME)));
    }

    #[test]
    fn summary_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 15);
        let session = rec.start(320, 200).unwrap();
        capture_spaced(&mut rec, 2);
        let summary = rec.stop().unwrap().unwrap();

        let content = std::fs::read_to_string(session.dir.join(paths::SUMMARY_FILE_NAME)).unwrap();
        let parsed: RecordingSummary = toml::from_str(&content).unwrap();
        assert_eq!(parsed, summary);
        assert_eq!((parsed.width, parsed.height, parsed.target_fps), (320, 200, 15));
    }

    #[test]
    fn zero_frames_skip_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let session = rec.start(8, 6).unwrap();
        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 0);
        assert!(summary.viewer.is_none());
        assert!(!session.dir.join(paths::VIEWER_FILE_NAME).exists());
        assert!(session.dir.join(paths::SUMMARY_FILE_NAME).exists());
    }

    #[test]
    fn captured_pixels_are_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let session = rec.start(8, 6).unwrap();
        let mut c = canvas();
        rec.capture_frame(&c);
        c.fill(rgb(255, 255, 255));
        rec.stop().unwrap();

        let saved = image::open(session.dir.join(paths::frame_file_name(0))).unwrap().to_rgba8();
        assert_eq!(saved.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    // ── throttling ────────────────────────────────────────────────────────────

    #[test]
    fn capture_is_limited_to_target_fps() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        rec.start(8, 6).unwrap();

        let base = Instant::now();
        let c = canvas();
        // 100 offers at 200 Hz over 495 ms.
        let queued = (0..100u64)
            .map(|i| rec.capture_frame_at(&c, base + Duration::from_millis(i * 5)))
            .filter(|o| matches!(o, CaptureOutcome::Queued(_)))
            .count();
        assert_eq!(queued, 15);
        assert!(queued as f64 <= 0.495 * 30.0 + 1.0);

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 15);
    }

    #[test]
    fn frames_inside_interval_are_throttled() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 10);
        rec.start(8, 6).unwrap();
        let base = Instant::now();
        let c = canvas();
        assert_eq!(rec.capture_frame_at(&c, base), CaptureOutcome::Queued(0));
        assert_eq!(
            rec.capture_frame_at(&c, base + Duration::from_millis(99)),
            CaptureOutcome::Throttled
        );
        assert_eq!(
            rec.capture_frame_at(&c, base + Duration::from_millis(100)),
            CaptureOutcome::Queued(1)
        );
        rec.stop().unwrap();
    }

    // ── pause ─────────────────────────────────────────────────────────────────

    #[test]
    fn paused_session_queues_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        rec.start(8, 6).unwrap();
        capture_spaced(&mut rec, 2);

        assert_eq!(rec.toggle_pause(), RecorderState::Paused);
        assert!(rec.is_recording());
        let paused = capture_spaced(&mut rec, 20);
        assert!(paused.iter().all(|o| *o == CaptureOutcome::Inactive));

        assert_eq!(rec.toggle_pause(), RecorderState::Recording);
        let base = Instant::now() + Duration::from_secs(60);
        assert_eq!(rec.capture_frame_at(&canvas(), base), CaptureOutcome::Queued(2));

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 3);
    }

    #[test]
    fn stop_while_paused_still_drains() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let session = rec.start(8, 6).unwrap();
        capture_spaced(&mut rec, 4);
        rec.toggle_pause();
        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 4);
        assert_eq!(frame_files(&session.dir).len(), 4);
    }

    // ── sessions ──────────────────────────────────────────────────────────────

    #[test]
    fn new_session_restarts_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        rec.start(8, 6).unwrap();
        capture_spaced(&mut rec, 3);
        rec.stop().unwrap();

        // Session directories have one-second resolution.
        std::thread::sleep(Duration::from_millis(1100));
        let second = rec.start(8, 6).unwrap();
        assert_eq!(capture_spaced(&mut rec, 1), [CaptureOutcome::Queued(0)]);
        rec.stop().unwrap();
        assert_eq!(frame_files(&second.dir), [paths::frame_file_name(0)]);
    }

    #[test]
    fn dropping_recorder_flushes_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = {
            let mut rec = recorder(dir.path(), 30);
            let session = rec.start(8, 6).unwrap();
            capture_spaced(&mut rec, 3);
            session
        };
        assert_eq!(frame_files(&session.dir).len(), 3);
        assert!(session.dir.join(paths::VIEWER_FILE_NAME).exists());
    }

    // ── queue pressure ────────────────────────────────────────────────────────

    type WriterThread = Result<JoinHandle<Result<WriterStats>>>;

    /// Consumes nothing until the stop flag is raised, then counts the queue.
    fn stalled_writer(
        _dir: PathBuf,
        mut rx: mpsc::Receiver<CapturedFrame>,
        stop_rx: watch::Receiver<bool>,
        written: Arc<AtomicU64>,
    ) -> WriterThread {
        Ok(std::thread::spawn(move || {
            while !*stop_rx.borrow() {
                std::thread::sleep(Duration::from_millis(1));
            }
            let mut stats = WriterStats::default();
            while rx.try_recv().is_ok() {
                stats.written += 1;
            }
            written.store(stats.written, Ordering::Release);
            Ok(stats)
        }))
    }

    fn small_queue(dir: &Path) -> Recorder {
        Recorder::new(RecorderConfig {
            output_dir: dir.to_path_buf(),
            fps: 30,
            queue_capacity: 1,
        })
    }

    #[test]
    fn full_queue_drops_are_counted_in_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = small_queue(dir.path());
        let session = rec.start_with(8, 6, stalled_writer).unwrap();

        let outcomes = capture_spaced(&mut rec, 10);
        assert_eq!(outcomes[0], CaptureOutcome::Queued(0));
        assert!(outcomes[1..].iter().all(|o| *o == CaptureOutcome::QueueFull));

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 1);
        assert_eq!(summary.frames_dropped, 9);
        let content = std::fs::read_to_string(session.dir.join(paths::SUMMARY_FILE_NAME)).unwrap();
        assert!(content.contains("frames_dropped = 9"));
    }

    #[test]
    fn slow_writer_accounts_for_every_offer() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = small_queue(dir.path());
        rec.start(1920, 1080).unwrap();

        let mut big = Canvas::new(1920, 1080);
        big.fill(rgb(40, 80, 120));
        let base = Instant::now();
        let outcomes: Vec<CaptureOutcome> = (0..200u64)
            .map(|i| rec.capture_frame_at(&big, base + Duration::from_secs(i)))
            .collect();
        let queued = outcomes.iter().filter(|o| matches!(o, CaptureOutcome::Queued(_))).count() as u64;
        let full = outcomes.iter().filter(|o| **o == CaptureOutcome::QueueFull).count() as u64;
        assert_eq!(queued + full, 200);

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, queued);
        assert_eq!(summary.frames_dropped, full);
    }

    // ── writer failures ───────────────────────────────────────────────────────

    fn failing_writer(
        _dir: PathBuf,
        rx: mpsc::Receiver<CapturedFrame>,
        _stop_rx: watch::Receiver<bool>,
        _written: Arc<AtomicU64>,
    ) -> WriterThread {
        drop(rx);
        Ok(std::thread::spawn(|| Err(anyhow::anyhow!("disk full"))))
    }

    fn panicking_writer(
        _dir: PathBuf,
        _rx: mpsc::Receiver<CapturedFrame>,
        _stop_rx: watch::Receiver<bool>,
        _written: Arc<AtomicU64>,
    ) -> WriterThread {
        Ok(std::thread::spawn(|| -> Result<WriterStats> { panic!("writer crashed") }))
    }

    #[test]
    fn writer_error_surfaces_at_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        rec.start_with(8, 6, failing_writer).unwrap();
        assert_eq!(rec.capture_frame(&canvas()), CaptureOutcome::WriterGone);

        let err = rec.stop().unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert_eq!(rec.state(), RecorderState::Idle);
        assert!(rec.stop().unwrap().is_none());
    }

    #[test]
    fn writer_panic_surfaces_at_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        rec.start_with(8, 6, panicking_writer).unwrap();
        assert!(rec.stop().is_err());
        assert_eq!(rec.state(), RecorderState::Idle);
        assert!(!rec.is_recording());
    }

    #[test]
    fn unwritable_frames_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path(), 30);
        let session = rec.start(8, 6).unwrap();
        std::fs::remove_dir_all(&session.dir).unwrap();
        capture_spaced(&mut rec, 3);

        let summary = rec.stop().unwrap().unwrap();
        assert_eq!(summary.frames_written, 0);
        assert_eq!(summary.frames_failed, 3);
        assert!(summary.viewer.is_none());
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[test]
    fn config_values_are_clamped() {
        let config = RecordingConfig {
            fps: 500,
            queue_capacity: 0,
            ..RecordingConfig::default()
        };
        let rc = RecorderConfig::from(&config);
        assert_eq!(rc.fps, crate::config::MAX_RECORDING_FPS);
        assert_eq!(rc.queue_capacity, crate::config::MIN_QUEUE_CAPACITY);
    }
}
