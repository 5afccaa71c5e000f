//! Built-in mini-games and the loop that drives them.
//!
//! Every game implements [`MiniGame`]; [`play`] owns the window for the
//! duration of a run and handles everything the games share (quit and
//! escape, fullscreen toggling, resize relayout, frame pacing and feeding
//! the recorder).
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::canvas::Canvas;
use crate::clock::FrameClock;
use crate::config::DEFAULT_FPS;
use crate::display::{self, DisplaySettings, Screen};
use crate::event::{InputEvent, InputState, Key};
use crate::recorder::Recorder;

pub mod car_racing;
pub mod rocket_vs_bomb;

/// What the launcher calls to run a game. Returns the score at exit.
pub type EntryPoint = fn(&mut dyn Screen, LaunchOptions<'_>) -> Result<u32>;

/// Optional arguments for an [`EntryPoint`]. `Default` is a windowed run
/// without recording at the default frame rate.
pub struct LaunchOptions<'a> {
    pub fullscreen: bool,
    /// Set while a recording session is active so the game feeds it frames.
    pub recorder: Option<&'a mut Recorder>,
    pub fps: u32,
}

impl Default for LaunchOptions<'_> {
    fn default() -> Self {
        Self {
            fullscreen: false,
            recorder: None,
            fps: DEFAULT_FPS,
        }
    }
}

/// The static id -> entry point table the registry resolves against.
pub fn builtin_entry_points() -> Vec<(&'static str, EntryPoint)> {
    vec![
        (car_racing::ID, car_racing::run as EntryPoint),
        (rocket_vs_bomb::ID, rocket_vs_bomb::run as EntryPoint),
    ]
}

/// Runs `entry` and turns any failure into a score of zero. Errors and
/// panics are logged here and never reach the caller.
pub fn run_guarded(
    id: &str,
    entry: EntryPoint,
    screen: &mut dyn Screen,
    options: LaunchOptions<'_>,
) -> u32 {
    info!(target: "game", "Starting {id}");
    match panic::catch_unwind(AssertUnwindSafe(|| entry(screen, options))) {
        Ok(Ok(score)) => {
            info!(target: "game", "{id} finished with score {score}");
            score
        }
        Ok(Err(e)) => {
            error!(target: "game", "{id} failed: {e:#}");
            0
        }
        Err(payload) => {
            error!(target: "game", "{id} panicked: {}", panic_message(payload.as_ref()));
            0
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// A fixed-timestep game driven by [`play`].
pub trait MiniGame {
    const TITLE: &'static str;
    /// Window size used whenever the game is not fullscreen.
    const WINDOWED: (u32, u32);

    /// Recomputes everything that depends on the drawable size. Calling it
    /// twice with the same size must leave the game unchanged.
    fn relayout(&mut self, width: u32, height: u32);

    /// A key went down this frame (after the shared bindings were handled).
    fn key_down(&mut self, key: Key);

    /// Advances one frame. `dt` is the fixed frame duration.
    fn update(&mut self, input: &InputState, dt: Duration);

    fn draw(&mut self, canvas: &mut Canvas);

    fn score(&self) -> u32;
}

/// Runs `game` until the window closes or Escape is pressed and returns its
/// score at that moment.
pub fn play<G: MiniGame>(
    game: &mut G,
    screen: &mut dyn Screen,
    mut options: LaunchOptions<'_>,
) -> Result<u32> {
    let (w, h) = G::WINDOWED;
    let mut settings = display::apply(
        screen,
        DisplaySettings::windowed(w, h).with_fullscreen(options.fullscreen),
    )?;
    screen.set_title(G::TITLE);
    game.relayout(settings.size.0, settings.size.1);

    let mut canvas = Canvas::new(settings.size.0, settings.size.1);
    let mut input = InputState::default();
    let mut clock = FrameClock::new(options.fps);
    let dt = clock.frame_duration();

    'frames: loop {
        for event in screen.poll_events() {
            input.apply(&event);
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => break 'frames,
                InputEvent::KeyDown(Key::F) => {
                    settings = display::toggle_fullscreen(screen, settings)?;
                    game.relayout(settings.size.0, settings.size.1);
                }
                InputEvent::KeyDown(key) => game.key_down(key),
                InputEvent::Resized(w, h) if w > 0 && h > 0 => {
                    settings.size = (w, h);
                    game.relayout(w, h);
                }
                _ => {}
            }
        }

        game.update(&input, dt);
        canvas.resize(settings.size.0, settings.size.1);
        game.draw(&mut canvas);
        screen.present(&canvas)?;
        if let Some(recorder) = options.recorder.as_deref_mut() {
            recorder.capture_frame(&canvas);
        }
        clock.tick();
    }

    Ok(game.score())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::headless::HeadlessScreen;

    /// Counts frames and keys; its score is the number of updates.
    #[derive(Default)]
    struct Counter {
        size: (u32, u32),
        relayouts: usize,
        keys: Vec<Key>,
        frames: u32,
    }

    impl MiniGame for Counter {
        const TITLE: &'static str = "Counter";
        const WINDOWED: (u32, u32) = (320, 240);

        fn relayout(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.relayouts += 1;
        }

        fn key_down(&mut self, key: Key) {
            self.keys.push(key);
        }

        fn update(&mut self, _input: &InputState, _dt: Duration) {
            self.frames += 1;
        }

        fn draw(&mut self, canvas: &mut Canvas) {
            canvas.fill(crate::canvas::WHITE);
        }

        fn score(&self) -> u32 {
            self.frames
        }
    }

    fn fast() -> LaunchOptions<'static> {
        LaunchOptions {
            fps: 1000,
            ..LaunchOptions::default()
        }
    }

    fn failing(_screen: &mut dyn Screen, _options: LaunchOptions<'_>) -> Result<u32> {
        anyhow::bail!("missing asset pack")
    }

    fn panicking(_screen: &mut dyn Screen, _options: LaunchOptions<'_>) -> Result<u32> {
        panic!("division by zero in spawner")
    }

    fn scoring(_screen: &mut dyn Screen, _options: LaunchOptions<'_>) -> Result<u32> {
        Ok(42)
    }

    // ── play ──────────────────────────────────────────────────────────────────

    #[test]
    fn play_runs_until_quit_and_returns_score() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen.idle_frames(5);
        let mut game = Counter::default();
        let score = play(&mut game, &mut screen, fast()).unwrap();
        assert_eq!(score, 5);
        assert_eq!(screen.presented, 5);
        assert_eq!(screen.titles, ["Counter"]);
        assert_eq!(game.size, (320, 240));
    }

    #[test]
    fn escape_ends_the_run() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen.idle_frames(2).push_frame(vec![InputEvent::KeyDown(Key::Escape)]).idle_frames(10);
        let mut game = Counter::default();
        assert_eq!(play(&mut game, &mut screen, fast()).unwrap(), 2);
    }

    #[test]
    fn f_toggles_fullscreen_and_relayouts() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen.push_frame(vec![InputEvent::KeyDown(Key::F)]);
        let mut game = Counter::default();
        play(&mut game, &mut screen, fast()).unwrap();
        assert_eq!(game.size, HeadlessScreen::MONITOR_SIZE);
        assert_eq!(game.relayouts, 2);
        assert!(game.keys.is_empty());
        let frame = screen.last_frame.unwrap();
        assert_eq!(frame.dimensions(), HeadlessScreen::MONITOR_SIZE);
    }

    #[test]
    fn launch_in_fullscreen_uses_monitor_size() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen.idle_frames(1);
        let mut game = Counter::default();
        let options = LaunchOptions { fullscreen: true, ..fast() };
        play(&mut game, &mut screen, options).unwrap();
        assert_eq!(game.size, HeadlessScreen::MONITOR_SIZE);
    }

    #[test]
    fn other_keys_reach_the_game_and_resize_relayouts() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen
            .push_frame(vec![InputEvent::KeyDown(Key::R), InputEvent::KeyUp(Key::R)])
            .push_frame(vec![InputEvent::Resized(640, 480), InputEvent::Resized(0, 0)]);
        let mut game = Counter::default();
        play(&mut game, &mut screen, fast()).unwrap();
        assert_eq!(game.keys, [Key::R]);
        assert_eq!(game.size, (640, 480));
    }

    // ── run_guarded ───────────────────────────────────────────────────────────

    #[test]
    fn guarded_error_scores_zero() {
        let mut screen = HeadlessScreen::new(10, 10);
        assert_eq!(run_guarded("failing", failing, &mut screen, LaunchOptions::default()), 0);
    }

    #[test]
    fn guarded_panic_scores_zero() {
        let mut screen = HeadlessScreen::new(10, 10);
        assert_eq!(run_guarded("panicking", panicking, &mut screen, LaunchOptions::default()), 0);
    }

    #[test]
    fn guarded_success_passes_score_through() {
        let mut screen = HeadlessScreen::new(10, 10);
        assert_eq!(run_guarded("scoring", scoring, &mut screen, LaunchOptions::default()), 42);
    }

    #[test]
    fn builtin_table_has_both_games() {
        let ids: Vec<&str> = builtin_entry_points().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ["car_racing", "rocket_vs_bomb"]);
    }
}
