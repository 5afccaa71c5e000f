//! Scripted, window-less [`Screen`] for loop tests.
use std::collections::VecDeque;

use anyhow::Result;
use image::RgbaImage;

use super::Screen;
use crate::canvas::Canvas;
use crate::event::InputEvent;

/// Replays one batch of events per `poll_events` call. Once the script runs
/// out it reports `Quit`, so every loop driven by it terminates.
pub struct HeadlessScreen {
    script: VecDeque<Vec<InputEvent>>,
    size: (u32, u32),
    pub presented: usize,
    pub titles: Vec<String>,
    pub last_frame: Option<RgbaImage>,
}

impl HeadlessScreen {
    pub const MONITOR_SIZE: (u32, u32) = (1920, 1080);

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            script: VecDeque::new(),
            size: (width, height),
            presented: 0,
            titles: Vec::new(),
            last_frame: None,
        }
    }

    /// Queues one frame's worth of events.
    pub fn push_frame(&mut self, events: Vec<InputEvent>) -> &mut Self {
        self.script.push_back(events);
        self
    }

    /// Current drawable size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Queues `n` frames without input.
    pub fn idle_frames(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.script.push_back(Vec::new());
        }
        self
    }
}

impl Screen for HeadlessScreen {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.script.pop_front().unwrap_or_else(|| vec![InputEvent::Quit])
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.presented += 1;
        self.last_frame = Some(canvas.snapshot());
        Ok(())
    }

    fn apply_mode(&mut self, fullscreen: bool, windowed: (u32, u32)) -> Result<(u32, u32)> {
        self.size = if fullscreen { Self::MONITOR_SIZE } else { windowed };
        Ok(self.size)
    }

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }
}
