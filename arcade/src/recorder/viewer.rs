//! Static HTML page that plays back a session's frames in a browser.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::paths;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Gameplay Recording Viewer</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; background-color: #222; color: white; }
        .controls { margin: 20px; }
        button { padding: 10px; margin: 5px; background-color: #444; color: white; border: none; cursor: pointer; }
        button:hover { background-color: #666; }
        #frame { max-width: 100%; border: 2px solid #444; }
        .slider-container { width: 80%; margin: 20px auto; }
        #frameSlider { width: 100%; }
    </style>
</head>
<body>
    <h1>Gameplay Recording Viewer</h1>
    <div class="controls">
        <button id="playButton">Play</button>
        <button id="pauseButton">Pause</button>
        <span id="frameCounter">Frame: 1 / @TOTAL_FRAMES@</span>
    </div>
    <div class="slider-container">
        <input type="range" min="0" max="@LAST_FRAME@" value="0" id="frameSlider">
    </div>
    <div>
        <img id="frame" src="@FIRST_FRAME@" alt="Frame">
    </div>

    <script>
        const totalFrames = @TOTAL_FRAMES@;
        const fps = @FPS@;
        let currentFrame = 0;
        let playInterval = null;

        const frameImg = document.getElementById('frame');
        const frameCounter = document.getElementById('frameCounter');
        const frameSlider = document.getElementById('frameSlider');

        function frameFile(index) {
            return `@PREFIX@${index.toString().padStart(@DIGITS@, '0')}.@EXT@`;
        }

        function updateFrame() {
            frameImg.src = frameFile(currentFrame);
            frameCounter.textContent = `Frame: ${currentFrame + 1} / ${totalFrames}`;
            frameSlider.value = currentFrame;
        }

        function nextFrame() {
            currentFrame = (currentFrame + 1) % totalFrames;
            updateFrame();
        }

        function pause() {
            clearInterval(playInterval);
            playInterval = null;
        }

        document.getElementById('playButton').addEventListener('click', () => {
            if (playInterval === null) {
                playInterval = setInterval(nextFrame, 1000 / fps);
            }
        });

        document.getElementById('pauseButton').addEventListener('click', pause);

        frameSlider.addEventListener('input', () => {
            pause();
            currentFrame = parseInt(frameSlider.value, 10);
            updateFrame();
        });

        updateFrame();
    </script>
</body>
</html>
"#;

/// Renders the viewer for `total_frames` frames played back at `fps`.
/// File names are derived with the same scheme the writer uses.
pub fn render(total_frames: u64, fps: u32) -> String {
    TEMPLATE
        .replace("@TOTAL_FRAMES@", &total_frames.to_string())
        .replace("@LAST_FRAME@", &total_frames.saturating_sub(1).to_string())
        .replace("@FPS@", &fps.max(1).to_string())
        .replace("@FIRST_FRAME@", &paths::frame_file_name(0))
        .replace("@PREFIX@", paths::FRAME_FILE_PREFIX)
        .replace("@DIGITS@", &paths::FRAME_INDEX_DIGITS.to_string())
        .replace("@EXT@", paths::FRAME_FILE_EXT)
}

/// Writes `viewer.html` into `session_dir` and returns its path.
pub fn write(session_dir: &Path, total_frames: u64, fps: u32) -> Result<PathBuf> {
    let path = session_dir.join(paths::VIEWER_FILE_NAME);
    std::fs::write(&path, render(total_frames, fps))
        .with_context(|| format!("Failed to write viewer {}", path.display()))?;
    Ok(path)
}
