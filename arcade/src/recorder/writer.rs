//! Background frame writer: drains the capture queue and persists each frame
//! as a numbered PNG in the session directory.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::paths;

/// How long the writer waits for a frame before re-checking the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An owned snapshot of one rendered frame.
pub struct CapturedFrame {
    /// Enqueue order within the session.
    pub seq: u64,
    pub image: RgbaImage,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
}

/// Starts the writer on its own thread with a single-threaded tokio runtime.
/// The thread ends once `stop_rx` reads `true` and the queue has been
/// drained, or once every sender is gone and the queue is empty.
pub fn spawn(
    dir: PathBuf,
    frame_rx: mpsc::Receiver<CapturedFrame>,
    stop_rx: watch::Receiver<bool>,
    progress: Arc<AtomicU64>,
) -> Result<JoinHandle<Result<WriterStats>>> {
    std::thread::Builder::new()
        .name("frame-writer".into())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("Failed to build writer runtime")?;
            Ok(runtime.block_on(run(&dir, frame_rx, stop_rx, &progress, POLL_INTERVAL)))
        })
        .context("Failed to spawn frame writer thread")
}

/// Writer loop. A frame that fails to persist is logged and skipped; the loop
/// itself never fails.
pub async fn run(
    dir: &Path,
    mut frame_rx: mpsc::Receiver<CapturedFrame>,
    stop_rx: watch::Receiver<bool>,
    progress: &AtomicU64,
    poll: Duration,
) -> WriterStats {
    let mut stats = WriterStats::default();
    debug!(target: "writer", "Started for {}", dir.display());

    loop {
        match tokio::time::timeout(poll, frame_rx.recv()).await {
            Ok(Some(frame)) => persist(dir, frame, &mut stats, progress),
            Ok(None) => break,
            Err(_) => {
                if *stop_rx.borrow() {
                    while let Ok(frame) = frame_rx.try_recv() {
                        persist(dir, frame, &mut stats, progress);
                    }
                    break;
                }
            }
        }
    }

    info!(
        target: "writer",
        "Frame processing complete: {} written, {} failed",
        stats.written,
        stats.failed
    );
    stats
}

/// Files are numbered by how many frames have been written so far, so a
/// failed frame leaves no hole in the sequence.
fn persist(dir: &Path, frame: CapturedFrame, stats: &mut WriterStats, progress: &AtomicU64) {
    let path = dir.join(paths::frame_file_name(stats.written));
    match frame.image.save_with_format(&path, ImageFormat::Png) {
        Ok(()) => {
            stats.written += 1;
            progress.store(stats.written, Ordering::Release);
        }
        Err(e) => {
            stats.failed += 1;
            warn!(target: "writer", "Skipping frame {}: failed to write {}: {e}", frame.seq, path.display());
        }
    }
}
