//! The drawable surface a loop renders to, and the display-mode value the
//! launcher owns and threads through fullscreen toggles.
use anyhow::Result;

use crate::canvas::Canvas;
use crate::event::InputEvent;

#[cfg(test)]
pub mod headless;
pub mod window;

/// What a render loop needs from the window: input, presentation, and mode switches.
pub trait Screen {
    /// Drains input that arrived since the last call. Never blocks.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Shows `canvas` on screen. The canvas may differ in size from the
    /// window; it is scaled to fit.
    fn present(&mut self, canvas: &Canvas) -> Result<()>;

    /// Enters fullscreen or returns to a `windowed`-sized window, and returns
    /// the resulting drawable size.
    fn apply_mode(&mut self, fullscreen: bool, windowed: (u32, u32)) -> Result<(u32, u32)>;

    fn set_title(&mut self, title: &str);
}

/// Display mode owned by the running loop. Passed into and returned from
/// [`toggle_fullscreen`] instead of living in shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub fullscreen: bool,
    /// Size used whenever the window is not fullscreen.
    pub windowed: (u32, u32),
    /// Size actually in effect after the last mode change.
    pub size: (u32, u32),
}

impl DisplaySettings {
    pub fn windowed(width: u32, height: u32) -> Self {
        Self {
            fullscreen: false,
            windowed: (width, height),
            size: (width, height),
        }
    }

    pub fn with_fullscreen(self, fullscreen: bool) -> Self {
        Self { fullscreen, ..self }
    }
}

/// Applies `settings` to `screen` and returns them with the resulting size filled in.
pub fn apply(screen: &mut dyn Screen, settings: DisplaySettings) -> Result<DisplaySettings> {
    let size = screen.apply_mode(settings.fullscreen, settings.windowed)?;
    Ok(DisplaySettings { size, ..settings })
}

/// Flips between fullscreen and windowed mode.
pub fn toggle_fullscreen(
    screen: &mut dyn Screen,
    settings: DisplaySettings,
) -> Result<DisplaySettings> {
    apply(screen, settings.with_fullscreen(!settings.fullscreen))
}
