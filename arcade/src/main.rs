mod assets;
mod canvas;
mod clock;
mod config;
mod display;
mod event;
mod font;
mod games;
mod geometry;
mod launcher;
mod paths;
mod recorder;
mod registry;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::display::window::WindowScreen;
use crate::launcher::Launcher;
use crate::registry::GameRegistry;

fn main() {
    // ── Logging ───────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("arcade-launcher v{} starting", env!("CARGO_PKG_VERSION"));

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        error!(target: "config", "Error (using defaults): {e:#}");
        config::Config::default()
    });

    // ── Game discovery ────────────────────────────────────────────────────────
    let registry = GameRegistry::discover(&config.games.dir);

    // ── Window ────────────────────────────────────────────────────────────────
    let (width, height) = config.display.windowed_size();
    let mut screen = match WindowScreen::open(launcher::TITLE, width, height) {
        Ok(screen) => screen,
        Err(e) => {
            error!(target: "display", "Failed to open window: {e:#}");
            std::process::exit(1);
        }
    };

    // ── Menu loop ─────────────────────────────────────────────────────────────
    let mut launcher = Launcher::new(registry, &config);
    if let Err(e) = launcher.run(&mut screen) {
        error!(target: "launcher", "Fatal error: {e:#}");
        std::process::exit(1);
    }
}
