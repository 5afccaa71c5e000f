//! Software RGBA render target shared by the launcher and the games.
//!
//! Every loop draws a full frame into a [`Canvas`], hands it to the display,
//! and, when recording, to the recorder which takes an owned snapshot.
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut,
    draw_hollow_circle_mut, draw_hollow_ellipse_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;

use crate::font::{self, GLYPH_ADVANCE, GLYPH_WIDTH};
use crate::geometry::Rect;

pub type Color = Rgba<u8>;

pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

pub const BLACK: Color = rgb(0, 0, 0);
pub const WHITE: Color = rgb(255, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Reallocates the pixel buffer when the size changed. Contents are not kept.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.size() != (width.max(1), height.max(1)) {
            *self = Canvas::new(width, height);
        }
    }

    #[cfg(test)]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Tightly packed RGBA8 rows.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Owned copy of the current pixels. The next frame overwrites the canvas,
    /// so anything that outlives the frame must take a snapshot.
    pub fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    pub fn fill(&mut self, color: Color) {
        for p in self.image.pixels_mut() {
            *p = color;
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(r) = to_imageproc(rect) {
            draw_filled_rect_mut(&mut self.image, r, color);
        }
    }

    /// Outline drawn inward from the rectangle's edge.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, thickness: i32) {
        for i in 0..thickness.max(1) {
            match to_imageproc(rect.inset(i, i)) {
                Some(r) => draw_hollow_rect_mut(&mut self.image, r, color),
                None => break,
            }
        }
    }

    pub fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Color) {
        if radius > 0 {
            draw_filled_circle_mut(&mut self.image, center, radius, color);
        }
    }

    pub fn stroke_circle(&mut self, center: (i32, i32), radius: i32, color: Color, thickness: i32) {
        for i in 0..thickness.max(1) {
            if radius - i <= 0 {
                break;
            }
            draw_hollow_circle_mut(&mut self.image, center, radius - i, color);
        }
    }

    /// Ellipse inscribed in `bounds`.
    pub fn fill_ellipse(&mut self, bounds: Rect, color: Color) {
        if !bounds.is_empty() {
            draw_filled_ellipse_mut(&mut self.image, bounds.center(), bounds.w / 2, bounds.h / 2, color);
        }
    }

    pub fn stroke_ellipse(&mut self, bounds: Rect, color: Color, thickness: i32) {
        for i in 0..thickness.max(1) {
            let r = bounds.inset(i, i);
            if r.is_empty() {
                break;
            }
            draw_hollow_ellipse_mut(&mut self.image, r.center(), r.w / 2, r.h / 2, color);
        }
    }

    pub fn fill_polygon(&mut self, points: &[(i32, i32)], color: Color) {
        let mut poly: Vec<Point<i32>> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        // imageproc rejects explicitly closed polygons.
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() >= 3 {
            draw_polygon_mut(&mut self.image, &poly, color);
        }
    }

    pub fn stroke_polygon(&mut self, points: &[(i32, i32)], color: Color) {
        for (i, &start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            self.line(start, end, color, 1);
        }
    }

    pub fn line(&mut self, start: (i32, i32), end: (i32, i32), color: Color, thickness: i32) {
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let horizontal = dx.abs() >= dy.abs();
        let t = thickness.max(1);
        for i in 0..t {
            let off = i - t / 2;
            let (ox, oy) = if horizontal { (0, off) } else { (off, 0) };
            draw_line_segment_mut(
                &mut self.image,
                ((start.0 + ox) as f32, (start.1 + oy) as f32),
                ((end.0 + ox) as f32, (end.1 + oy) as f32),
                color,
            );
        }
    }

    /// Blends `color` over `rect` with the given opacity (0 = none, 255 = opaque).
    pub fn shade(&mut self, rect: Rect, color: Color, alpha: u8) {
        let x0 = rect.x.max(0) as u32;
        let y0 = rect.y.max(0) as u32;
        let x1 = (rect.right().max(0) as u32).min(self.width());
        let y1 = (rect.bottom().max(0) as u32).min(self.height());
        let a = alpha as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = self.image.get_pixel_mut(x, y);
                for c in 0..3 {
                    p.0[c] = ((color.0[c] as u32 * a + p.0[c] as u32 * (255 - a)) / 255) as u8;
                }
            }
        }
    }

    /// Draws `image` with its top-left corner at `(x, y)`, honouring its alpha channel.
    pub fn blit(&mut self, image: &RgbaImage, x: i32, y: i32) {
        imageops::overlay(&mut self.image, image, x as i64, y as i64);
    }

    /// Renders `text` anchored at `(x, y)`: `align` picks which horizontal edge
    /// (or the centre) sits on `x`, and the text is vertically centred on `y`.
    /// Returns the covered rectangle.
    pub fn draw_text(
        &mut self,
        text: &str,
        size: u32,
        color: Color,
        x: i32,
        y: i32,
        align: TextAlign,
    ) -> Rect {
        let scale = font::scale_for_size(size);
        let w = font::text_width(text, size);
        let h = font::text_height(size);
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - w / 2,
            TextAlign::Right => x - w,
        };
        let top = y - h / 2;

        for (i, c) in text.chars().enumerate() {
            let gx = left + i as i32 * GLYPH_ADVANCE * scale;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.fill_rect(
                            Rect::new(gx + col * scale, top + row as i32 * scale, scale, scale),
                            color,
                        );
                    }
                }
            }
        }
        Rect::new(left, top, w, h)
    }
}

fn to_imageproc(rect: Rect) -> Option<imageproc::rect::Rect> {
    if rect.is_empty() {
        return None;
    }
    Some(imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.w as u32, rect.h as u32))
}
