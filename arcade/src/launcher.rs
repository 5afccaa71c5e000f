//! The menu: one tile per discovered game plus fullscreen and record
//! buttons. Launching a game hands the window to it until it returns.
use std::path::PathBuf;

use anyhow::Result;
use image::RgbaImage;
use tracing::{error, info};

use crate::assets;
use crate::canvas::{rgb, Canvas, Color, TextAlign, WHITE};
use crate::clock::FrameClock;
use crate::config::Config;
use crate::display::{self, DisplaySettings, Screen};
use crate::event::{InputEvent, Key};
use crate::font;
use crate::games::{self, LaunchOptions};
use crate::geometry::Rect;
use crate::recorder::{Recorder, RecorderConfig};
use crate::registry::GameRegistry;

pub const TITLE: &str = "Arcade Launcher";

const BACKGROUND: Color = rgb(20, 20, 40);
const HEADER: Color = rgb(30, 30, 60);
const HIGHLIGHT: Color = rgb(100, 150, 255);
const BUTTON: Color = rgb(50, 50, 80);
const BUTTON_HOVER: Color = rgb(70, 70, 120);
const RECORD_RED: Color = rgb(255, 50, 50);
const HINT: Color = rgb(180, 180, 200);

const HEADER_HEIGHT: i32 = 100;
const FIRST_ROW_Y: i32 = 150;
const BUTTON_WIDTH: i32 = 180;
const BUTTON_HEIGHT: i32 = 40;

/// A clickable region of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Index into the registry's game list.
    Tile(usize),
    Fullscreen,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLayout {
    pub tiles: Vec<Rect>,
    pub fullscreen_button: Rect,
    pub record_button: Rect,
}

impl MenuLayout {
    /// The control under `(x, y)`, tiles first.
    pub fn hit(&self, x: i32, y: i32) -> Option<Control> {
        if let Some(i) = self.tiles.iter().position(|t| t.contains(x, y)) {
            return Some(Control::Tile(i));
        }
        if self.fullscreen_button.contains(x, y) {
            return Some(Control::Fullscreen);
        }
        if self.record_button.contains(x, y) {
            return Some(Control::Record);
        }
        None
    }
}

/// Tile grid and button placement for a window of `width` x `height`.
pub fn menu_layout(width: u32, height: u32, tile_count: usize) -> MenuLayout {
    let (w, h) = (width as i32, height as i32);
    let tile_w = 280.min((f64::from(width) * 0.25) as i32);
    let tile_h = (f64::from(tile_w) * 0.7) as i32;
    let margin = (f64::from(width) * 0.03) as i32;
    let cols = (w / (tile_w + margin).max(1)).clamp(2, 5);

    let tiles = (0..tile_count as i32)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Rect::new(
                margin + col * (tile_w + margin),
                FIRST_ROW_Y + row * (tile_h + margin),
                tile_w,
                tile_h,
            )
        })
        .collect();

    MenuLayout {
        tiles,
        fullscreen_button: Rect::new(w - 200, h - 60, BUTTON_WIDTH, BUTTON_HEIGHT),
        record_button: Rect::new(20, h - 60, BUTTON_WIDTH, BUTTON_HEIGHT),
    }
}

pub struct Launcher {
    registry: GameRegistry,
    games_dir: PathBuf,
    settings: DisplaySettings,
    fps: u32,
    recorder: Recorder,
    layout: MenuLayout,
    hover: Option<Control>,
    /// Decoded once at startup, one slot per game.
    thumbnails: Vec<Option<RgbaImage>>,
    /// `thumbnails` scaled to the current tile size.
    scaled_thumbnails: Vec<Option<RgbaImage>>,
    canvas: Canvas,
}

impl Launcher {
    pub fn new(registry: GameRegistry, config: &Config) -> Self {
        let (w, h) = config.display.windowed_size();
        let settings = DisplaySettings::windowed(w, h).with_fullscreen(config.display.fullscreen);
        let thumbnails = registry
            .games()
            .iter()
            .map(|g| g.thumbnail.as_deref().map(|p| assets::load_image(p, None)))
            .collect();
        let mut launcher = Self {
            registry,
            games_dir: config.games.dir.clone(),
            settings,
            fps: config.display.effective_fps(),
            recorder: Recorder::new(RecorderConfig::from(&config.recording)),
            layout: menu_layout(w, h, 0),
            hover: None,
            thumbnails,
            scaled_thumbnails: Vec::new(),
            canvas: Canvas::new(w, h),
        };
        launcher.rebuild_layout();
        launcher
    }

    /// Runs the menu until the window closes or Escape is pressed. A
    /// recording still open at that point is stopped before returning.
    pub fn run(&mut self, screen: &mut dyn Screen) -> Result<()> {
        self.settings = display::apply(screen, self.settings)?;
        screen.set_title(TITLE);
        self.rebuild_layout();
        info!(target: "launcher", "{} game(s) available", self.registry.games().len());

        let mut clock = FrameClock::new(self.fps);
        'menu: loop {
            for event in screen.poll_events() {
                if !self.handle_event(screen, event)? {
                    break 'menu;
                }
            }

            self.draw();
            screen.present(&self.canvas)?;
            if self.recorder.is_recording() {
                self.recorder.capture_frame(&self.canvas);
            }
            clock.tick();
        }

        self.stop_recording();
        info!(target: "launcher", "Exiting");
        Ok(())
    }

    /// Returns `false` when the menu should close.
    fn handle_event(&mut self, screen: &mut dyn Screen, event: InputEvent) -> Result<bool> {
        match event {
            InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => return Ok(false),
            InputEvent::KeyDown(Key::F) => self.toggle_fullscreen(screen)?,
            InputEvent::KeyDown(Key::R) => self.toggle_recording(),
            InputEvent::KeyDown(Key::P) => {
                self.recorder.toggle_pause();
            }
            InputEvent::PointerMoved(x, y) => self.hover = self.layout.hit(x, y),
            InputEvent::Click(x, y) => match self.layout.hit(x, y) {
                Some(Control::Tile(index)) => self.launch_game(screen, index)?,
                Some(Control::Fullscreen) => self.toggle_fullscreen(screen)?,
                Some(Control::Record) => self.toggle_recording(),
                None => {}
            },
            InputEvent::Resized(w, h) if w > 0 && h > 0 => {
                self.settings.size = (w, h);
                if !self.settings.fullscreen {
                    self.settings.windowed = (w, h);
                }
                self.rebuild_layout();
            }
            _ => {}
        }
        Ok(true)
    }

    fn toggle_fullscreen(&mut self, screen: &mut dyn Screen) -> Result<()> {
        self.settings = display::toggle_fullscreen(screen, self.settings)?;
        self.rebuild_layout();
        Ok(())
    }

    fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            self.stop_recording();
        } else {
            let (w, h) = self.settings.size;
            if let Err(e) = self.recorder.start(w, h) {
                error!(target: "launcher", "Failed to start recording: {e:#}");
            }
        }
    }

    fn stop_recording(&mut self) {
        match self.recorder.stop() {
            Ok(Some(summary)) => info!(
                target: "launcher",
                "Saved {} frame(s) to {}",
                summary.frames_written,
                summary.session_dir.display()
            ),
            Ok(None) => {}
            Err(e) => error!(target: "launcher", "Recording failed: {e:#}"),
        }
    }

    /// Runs the game behind tile `index`. Any failure to resolve or run it is
    /// logged and the menu carries on; afterwards the menu's display mode is
    /// restored and the layout rebuilt for the current size.
    pub fn launch_game(&mut self, screen: &mut dyn Screen, index: usize) -> Result<()> {
        let Some(game) = self.registry.games().get(index) else {
            return Ok(());
        };
        let (id, name) = (game.id.clone(), game.display_name.clone());
        info!(target: "launcher", "Launching {name} from {}", game.source_path.display());

        match self.registry.resolve_entry_point(&id) {
            Ok(entry) => {
                let recording = self.recorder.is_recording();
                let options = LaunchOptions {
                    fullscreen: self.settings.fullscreen,
                    recorder: recording.then_some(&mut self.recorder),
                    fps: self.fps,
                };
                let score = games::run_guarded(&id, entry, screen, options);
                info!(target: "launcher", "Game '{name}' finished with score: {score}");
            }
            Err(e) => error!(target: "launcher", "Error launching game: {e}"),
        }

        self.settings = display::apply(screen, self.settings)?;
        screen.set_title(TITLE);
        self.hover = None;
        self.rebuild_layout();
        Ok(())
    }

    fn rebuild_layout(&mut self) {
        let (w, h) = self.settings.size;
        self.layout = menu_layout(w, h, self.registry.games().len());
        self.canvas.resize(w, h);
        self.scaled_thumbnails = self
            .thumbnails
            .iter()
            .zip(&self.layout.tiles)
            .map(|(thumb, tile)| {
                let (max_w, max_h) = thumbnail_box(tile);
                thumb.as_ref().map(|img| assets::fit_within(img, max_w, max_h))
            })
            .collect();
    }

    fn draw(&mut self) {
        let (w, h) = (self.canvas.width() as i32, self.canvas.height() as i32);
        let canvas = &mut self.canvas;
        canvas.fill(BACKGROUND);

        canvas.fill_rect(Rect::new(0, 0, w, HEADER_HEIGHT), HEADER);
        canvas.line((0, HEADER_HEIGHT), (w, HEADER_HEIGHT), HIGHLIGHT, 3);
        canvas.draw_text("ARCADE LAUNCHER", 48, WHITE, w / 2, HEADER_HEIGHT / 2, TextAlign::Center);

        for (i, (tile, game)) in self.layout.tiles.iter().zip(self.registry.games()).enumerate() {
            let hovered = self.hover == Some(Control::Tile(i));
            canvas.fill_rect(*tile, if hovered { BUTTON_HOVER } else { BUTTON });
            canvas.stroke_rect(*tile, HIGHLIGHT, 3);

            let (cx, cy) = tile.center();
            if let Some(Some(thumb)) = self.scaled_thumbnails.get(i) {
                let x = cx - thumb.width() as i32 / 2;
                canvas.blit(thumb, x, tile.y + 8);
            }
            let size = if font::text_width(&game.display_name, 24) <= tile.w - 12 { 24 } else { 16 };
            canvas.draw_text(&game.display_name, size, WHITE, cx, cy + tile.h / 8, TextAlign::Center);
            canvas.draw_text("Click to Play", 16, WHITE, cx, cy + tile.h / 3, TextAlign::Center);
        }

        let hovered_description = match self.hover {
            Some(Control::Tile(i)) => self.registry.games().get(i).and_then(|g| g.description.as_deref()),
            _ => None,
        };
        if let Some(description) = hovered_description {
            canvas.draw_text(description, 16, HINT, w / 2, h - 90, TextAlign::Center);
        }

        if self.layout.tiles.is_empty() {
            let hint = match self.registry.diagnostic() {
                Some(diagnostic) => diagnostic.to_string(),
                None => format!("No games found in {}", self.games_dir.display()),
            };
            canvas.draw_text(&hint, 16, HINT, w / 2, h / 2, TextAlign::Center);
        }

        let fs = self.layout.fullscreen_button;
        let fs_hover = self.hover == Some(Control::Fullscreen);
        canvas.fill_rect(fs, if fs_hover { BUTTON_HOVER } else { BUTTON });
        canvas.stroke_rect(fs, HIGHLIGHT, 3);
        let fs_label = if self.settings.fullscreen { "Windowed" } else { "Fullscreen" };
        let (fx, fy) = fs.center();
        canvas.draw_text(fs_label, 16, WHITE, fx, fy, TextAlign::Center);

        let rec = self.layout.record_button;
        let recording = self.recorder.is_recording();
        let rec_color = if recording {
            RECORD_RED
        } else if self.hover == Some(Control::Record) {
            BUTTON_HOVER
        } else {
            BUTTON
        };
        canvas.fill_rect(rec, rec_color);
        canvas.stroke_rect(rec, HIGHLIGHT, 3);
        let rec_label = if recording { "Stop Recording" } else { "Start Recording" };
        let (rx, ry) = rec.center();
        canvas.draw_text(rec_label, 16, WHITE, rx, ry, TextAlign::Center);

        if recording {
            canvas.fill_circle((30, 30), 10, RECORD_RED);
            let frames = self.recorder.frame_count();
            let label = if self.recorder.is_paused() {
                format!("REC PAUSED {frames}")
            } else {
                format!("REC {frames}")
            };
            canvas.draw_text(&label, 16, RECORD_RED, 45, 30, TextAlign::Left);
        }

        canvas.draw_text(
            "ESC quit | F fullscreen | R record | P pause",
            16,
            WHITE,
            w / 2,
            h - 30,
            TextAlign::Center,
        );
    }
}

/// Space a thumbnail may occupy at the top of `tile`.
fn thumbnail_box(tile: &Rect) -> (u32, u32) {
    let max_w = (tile.w - 16).max(1) as u32;
    let max_h = (tile.h / 2 - 16).max(1) as u32;
    (max_w, max_h)
}
