//! Image and sound loading with visible fallbacks. A missing asset never
//! aborts a game; it is logged and replaced.
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PLACEHOLDER_SIZE: u32 = 50;
/// Magenta, so a missing texture is obvious on screen.
pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Raw sound file contents.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SoundClip {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Loads and decodes the image at `path`, optionally resized to `scale`.
/// On any failure logs a warning and returns the magenta placeholder
/// (resized as well when `scale` is given).
pub fn load_image(path: &Path, scale: Option<(u32, u32)>) -> RgbaImage {
    let image = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            warn!(target: "assets", "Error loading image {}: {e}", path.display());
            placeholder()
        }
    };
    match scale {
        Some((w, h)) if w > 0 && h > 0 && image.dimensions() != (w, h) => {
            imageops::resize(&image, w, h, FilterType::Triangle)
        }
        _ => image,
    }
}

/// Scales `image` to fit inside `max_w` x `max_h` keeping its aspect ratio.
pub fn fit_within(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || max_w == 0 || max_h == 0 {
        return image.clone();
    }
    let ratio = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
    let nw = ((w as f64 * ratio).round() as u32).max(1);
    let nh = ((h as f64 * ratio).round() as u32).max(1);
    imageops::resize(image, nw, nh, FilterType::Triangle)
}

/// Reads the sound file at `path`. Returns `None` (and logs) if it is missing or unreadable.
///
/// The arcade has no audio output; clips are loaded as raw bytes and no
/// built-in game plays them.
#[allow(dead_code)]
pub fn load_sound(path: &Path) -> Option<SoundClip> {
    match std::fs::read(path) {
        Ok(bytes) => Some(SoundClip {
            path: path.to_path_buf(),
            bytes,
        }),
        Err(e) => {
            warn!(target: "assets", "Error loading sound {}: {e}", path.display());
            None
        }
    }
}

pub fn placeholder() -> RgbaImage {
    RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, PLACEHOLDER_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let img = load_image(&dir.path().join("nope.png"), None);
        assert_eq!(img.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        assert!(img.pixels().all(|p| *p == PLACEHOLDER_COLOR));
    }

    #[test]
    fn corrupt_image_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let img = load_image(&path, None);
        assert_eq!(*img.get_pixel(0, 0), PLACEHOLDER_COLOR);
    }

    #[test]
    fn placeholder_is_scaled_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let img = load_image(&dir.path().join("nope.png"), Some((20, 10)));
        assert_eq!(img.dimensions(), (20, 10));
    }

    #[test]
    fn valid_png_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.png");
        let src = RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]));
        src.save(&path).unwrap();

        let img = load_image(&path, None);
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(*img.get_pixel(3, 2), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn fit_within_keeps_aspect_ratio() {
        let src = RgbaImage::new(200, 100);
        let out = fit_within(&src, 100, 100);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn missing_sound_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_sound(&dir.path().join("boom.wav")).is_none());
    }

    #[test]
    fn existing_sound_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boom.wav");
        std::fs::write(&path, b"RIFF....").unwrap();
        let clip = load_sound(&path).unwrap();
        assert_eq!(clip.bytes, b"RIFF....");
        assert_eq!(clip.path, path);
    }
}
