//! Native window backed by winit for input and pixels for presenting the
//! software canvas.
//!
//! Events are collected with winit's pump API rather than `EventLoop::run`,
//! so the launcher and each game keep an ordinary blocking loop that owns
//! the window for as long as it runs.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::Screen;
use crate::canvas::Canvas;
use crate::event::{InputEvent, Key};

/// Window events before cursor positions are mapped into canvas space.
enum RawEvent {
    Input(InputEvent),
    CursorMoved(f64, f64),
    LeftPressed,
    Resized(u32, u32),
}

pub struct WindowScreen {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    pixels: Pixels<'static>,
    /// Window surface size.
    size: (u32, u32),
    /// Size of the pixel buffer the canvas is copied into.
    buffer_size: (u32, u32),
    /// Last cursor position in window coordinates.
    cursor: (f64, f64),
}

impl WindowScreen {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface).context("Failed to initialize renderer")?;

        info!(target: "display", "Window opened at {}x{}", inner.width, inner.height);
        Ok(Self {
            event_loop,
            window,
            pixels,
            size: (inner.width, inner.height),
            buffer_size: (width, height),
            cursor: (0.0, 0.0),
        })
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 || (width, height) == self.size {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .context("Failed to resize window surface")?;
        self.size = (width, height);
        debug!(target: "display", "Surface resized to {width}x{height}");
        Ok(())
    }

    fn resize_buffer(&mut self, width: u32, height: u32) -> Result<()> {
        self.pixels
            .resize_buffer(width, height)
            .context("Failed to resize pixel buffer")?;
        self.buffer_size = (width, height);
        Ok(())
    }

    /// Maps a window position into pixel-buffer coordinates, clamping
    /// positions that fall on the letterbox border.
    fn to_canvas(&self, (x, y): (f64, f64)) -> (i32, i32) {
        match self.pixels.window_pos_to_pixel((x as f32, y as f32)) {
            Ok((px, py)) => (px as i32, py as i32),
            Err((px, py)) => (px as i32, py as i32),
        }
    }
}

impl Screen for WindowScreen {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut raw = Vec::new();
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _target| {
                if let Event::WindowEvent { event, .. } = event {
                    if let Some(e) = translate(event) {
                        raw.push(e);
                    }
                }
            });
        if let PumpStatus::Exit(_) = status {
            raw.push(RawEvent::Input(InputEvent::Quit));
        }

        let mut events = Vec::with_capacity(raw.len());
        for e in raw {
            match e {
                RawEvent::Input(input) => events.push(input),
                RawEvent::CursorMoved(x, y) => {
                    self.cursor = (x, y);
                    let (cx, cy) = self.to_canvas(self.cursor);
                    events.push(InputEvent::PointerMoved(cx, cy));
                }
                RawEvent::LeftPressed => {
                    let (cx, cy) = self.to_canvas(self.cursor);
                    events.push(InputEvent::Click(cx, cy));
                }
                RawEvent::Resized(w, h) => {
                    if let Err(err) = self.resize_surface(w, h) {
                        warn!(target: "display", "{err:#}");
                        continue;
                    }
                    events.push(InputEvent::Resized(w, h));
                }
            }
        }
        events
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        if canvas.size() != self.buffer_size {
            let (w, h) = canvas.size();
            self.resize_buffer(w, h)?;
        }
        self.pixels.frame_mut().copy_from_slice(canvas.as_raw());
        self.pixels.render().context("Failed to render frame")
    }

    fn apply_mode(&mut self, fullscreen: bool, windowed: (u32, u32)) -> Result<(u32, u32)> {
        let size = if fullscreen {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            self.window
                .current_monitor()
                .map(|m| m.size())
                .unwrap_or_else(|| self.window.inner_size())
        } else {
            self.window.set_fullscreen(None);
            let requested = PhysicalSize::new(windowed.0, windowed.1);
            self.window.request_inner_size(requested).unwrap_or(requested)
        };
        self.resize_surface(size.width, size.height)?;
        info!(
            target: "display",
            "{} at {}x{}",
            if fullscreen { "Fullscreen" } else { "Windowed" },
            self.size.0,
            self.size.1
        );
        Ok(self.size)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

fn translate(event: WindowEvent) -> Option<RawEvent> {
    match event {
        WindowEvent::CloseRequested => Some(RawEvent::Input(InputEvent::Quit)),
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat,
                    ..
                },
            ..
        } => {
            let key = map_key(code)?;
            match state {
                ElementState::Pressed if !repeat => Some(RawEvent::Input(InputEvent::KeyDown(key))),
                ElementState::Pressed => None,
                ElementState::Released => Some(RawEvent::Input(InputEvent::KeyUp(key))),
            }
        }
        WindowEvent::CursorMoved { position, .. } => Some(RawEvent::CursorMoved(position.x, position.y)),
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            button: MouseButton::Left,
            ..
        } => Some(RawEvent::LeftPressed),
        WindowEvent::Resized(size) => Some(RawEvent::Resized(size.width, size.height)),
        _ => None,
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyR => Key::R,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}
