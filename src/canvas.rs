//! Software drawing surface with a fixed logical size.
//!
//! Callers draw in logical units; the canvas scales them uniformly onto its
//! pixel grid and letterboxes the remainder. Pixels are square, which is what
//! the half-block presenter gives us: one terminal cell holds two pixels
//! stacked vertically.

use crate::config::Rgb;
use crate::geom::{Point, Rect};
use std::io::{self, Write};

pub struct Canvas {
    width: usize,
    height: usize,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    background: Rgb,
    pixels: Vec<Rgb>,
    output_buf: Vec<u8>,
}

impl Canvas {
    pub fn new(
        width: usize,
        height: usize,
        logical_width: f32,
        logical_height: f32,
        background: Rgb,
    ) -> Self {
        let scale = (width as f32 / logical_width).min(height as f32 / logical_height);
        let offset_x = (width as f32 - logical_width * scale) * 0.5;
        let offset_y = (height as f32 - logical_height * scale) * 0.5;

        Self {
            width,
            height,
            scale,
            offset_x,
            offset_y,
            background,
            pixels: vec![background; width * height],
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Pixel coordinates of a logical point.
    pub fn to_pixel(&self, p: Point) -> (f32, f32) {
        (self.offset_x + p.x * self.scale, self.offset_y + p.y * self.scale)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    /// Blend `color` over the whole surface.
    pub fn overlay(&mut self, color: Rgb, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        let alpha = alpha.min(1.0);
        for px in self.pixels.iter_mut() {
            *px = blend(*px, color, alpha);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let (x0, y0) = self.to_pixel(Point::new(rect.x, rect.y));
        let (x1, y1) = self.to_pixel(Point::new(rect.right(), rect.bottom()));
        let Some((cx0, cx1)) = self.clip_span(x0, x1, self.width) else {
            return;
        };
        let Some((cy0, cy1)) = self.clip_span(y0, y1, self.height) else {
            return;
        };

        for y in cy0..cy1 {
            for x in cx0..cx1 {
                self.blend_at(x, y, color, alpha);
            }
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb, alpha: f32) {
        let (cx, cy) = self.to_pixel(center);
        let r = (radius * self.scale).max(0.5);
        self.fill_pixel_capsule((cx, cy), (cx, cy), r, color, alpha);
    }

    /// Stroke a polyline with round joins and caps. With `dash = Some((on, off))`
    /// only the "on" stretches are painted; the pattern runs continuously
    /// across vertices.
    pub fn stroke_polyline(
        &mut self,
        points: &[Point],
        width: f32,
        color: Rgb,
        dash: Option<(f32, f32)>,
    ) {
        if points.is_empty() {
            return;
        }
        let r = (width * 0.5 * self.scale).max(0.5);

        if points.len() == 1 {
            let p = self.to_pixel(points[0]);
            self.fill_pixel_capsule(p, p, r, color, 1.0);
            return;
        }

        let Some((on, off)) = dash else {
            for pair in points.windows(2) {
                let a = self.to_pixel(pair[0]);
                let b = self.to_pixel(pair[1]);
                self.fill_pixel_capsule(a, b, r, color, 1.0);
            }
            return;
        };

        let period = on + off;
        // Distance already consumed inside the current dash period.
        let mut phase = 0.0f32;
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let len = a.distance(b);
            if len <= f32::EPSILON {
                continue;
            }

            let mut t = 0.0f32;
            while t < len {
                let in_dash = phase < on;
                let remaining_in_state = if in_dash { on - phase } else { period - phase };
                let step = remaining_in_state.min(len - t);

                if in_dash {
                    let p0 = self.to_pixel(a.lerp(b, t / len));
                    let p1 = self.to_pixel(a.lerp(b, (t + step) / len));
                    self.fill_pixel_capsule(p0, p1, r, color, 1.0);
                }

                t += step;
                phase += step;
                if phase >= period {
                    phase -= period;
                }
            }
        }
    }

    /// Encode the surface as 24-bit ANSI half blocks and write it out.
    pub fn present<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H"); // Move to home

        let mut prev_top: Rgb = (255, 255, 255);
        let mut prev_bot: Rgb = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top = self.pixels[y * self.width + x];
                let bot = if y + 1 < self.height {
                    self.pixels[(y + 1) * self.width + x]
                } else {
                    self.background
                };

                // Only emit color codes if changed
                if top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = (255, 255, 255);
            prev_bot = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }

    fn clip_span(&self, a: f32, b: f32, limit: usize) -> Option<(usize, usize)> {
        let lo = a.min(b).round().max(0.0);
        let hi = a.max(b).round().min(limit as f32);
        if hi <= lo {
            return None;
        }
        Some((lo as usize, hi as usize))
    }

    /// Paint every pixel whose centre lies within `r` of the segment `a`-`b`
    /// (pixel coordinates).
    fn fill_pixel_capsule(&mut self, a: (f32, f32), b: (f32, f32), r: f32, color: Rgb, alpha: f32) {
        if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
            return;
        }
        let min_x = (a.0.min(b.0) - r).floor().max(0.0);
        let max_x = (a.0.max(b.0) + r).ceil().min(self.width as f32);
        let min_y = (a.1.min(b.1) - r).floor().max(0.0);
        let max_y = (a.1.max(b.1) + r).ceil().min(self.height as f32);
        if max_x <= min_x || max_y <= min_y {
            return;
        }

        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len2 = dx * dx + dy * dy;
        let r2 = r * r;

        for y in min_y as usize..max_y as usize {
            let py = y as f32 + 0.5;
            for x in min_x as usize..max_x as usize {
                let px = x as f32 + 0.5;
                let t = if len2 > 0.0 {
                    (((px - a.0) * dx + (py - a.1) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let ex = px - (a.0 + dx * t);
                let ey = py - (a.1 + dy * t);
                if ex * ex + ey * ey <= r2 {
                    self.blend_at(x, y, color, alpha);
                }
            }
        }
    }

    fn blend_at(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        let idx = y * self.width + x;
        self.pixels[idx] = blend(self.pixels[idx], color, alpha);
    }
}

/// `alpha` of `src` over `dst`.
pub fn blend(dst: Rgb, src: Rgb, alpha: f32) -> Rgb {
    if alpha >= 1.0 {
        return src;
    }
    let a = alpha.max(0.0);
    (
        (dst.0 as f32 * (1.0 - a) + src.0 as f32 * a) as u8,
        (dst.1 as f32 * (1.0 - a) + src.1 as f32 * a) as u8,
        (dst.2 as f32 * (1.0 - a) + src.2 as f32 * a) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = (255, 0, 0);

    fn canvas() -> Canvas {
        // 1 pixel per logical unit
        Canvas::new(100, 80, 100.0, 80.0, (0, 0, 0))
    }

    #[test]
    fn scale_letterboxes_the_short_axis() {
        let c = Canvas::new(200, 100, 100.0, 100.0, (0, 0, 0));
        assert_eq!(c.to_pixel(Point::new(0.0, 0.0)), (50.0, 0.0));
        assert_eq!(c.to_pixel(Point::new(100.0, 100.0)), (150.0, 100.0));
    }

    #[test]
    fn fill_circle_covers_center_not_corners() {
        let mut c = canvas();
        c.fill_circle(Point::new(50.0, 40.0), 10.0, RED, 1.0);
        assert_eq!(c.pixel(50, 40), Some(RED));
        assert_eq!(c.pixel(57, 40), Some(RED));
        assert_eq!(c.pixel(58, 48), Some((0, 0, 0)));
        assert_eq!(c.pixel(0, 0), Some((0, 0, 0)));
    }

    #[test]
    fn shapes_outside_the_surface_are_clipped() {
        let mut c = canvas();
        c.fill_circle(Point::new(-500.0, -500.0), 10.0, RED, 1.0);
        c.fill_rect(Rect::new(90.0, 70.0, 50.0, 50.0), RED, 1.0);
        assert_eq!(c.pixel(99, 79), Some(RED));
        assert_eq!(c.pixel(89, 69), Some((0, 0, 0)));
    }

    #[test]
    fn dashed_stroke_leaves_gaps() {
        let mut solid = canvas();
        let mut dashed = canvas();
        let line = [Point::new(10.0, 40.0), Point::new(90.0, 40.0)];
        solid.stroke_polyline(&line, 1.0, RED, None);
        dashed.stroke_polyline(&line, 1.0, RED, Some((5.0, 3.0)));

        let count = |c: &Canvas| (0..100).filter(|&x| c.pixel(x, 40) == Some(RED)).count();
        assert!(count(&solid) > count(&dashed));
        assert!(count(&dashed) > 0);
        // first dash starts at the line start, the gap at 15..18 stays clear
        assert_eq!(dashed.pixel(11, 40), Some(RED));
        assert_eq!(dashed.pixel(16, 40), Some((0, 0, 0)));
    }

    #[test]
    fn overlay_blends_toward_color() {
        let mut c = canvas();
        c.overlay((200, 100, 0), 0.5);
        assert_eq!(c.pixel(3, 3), Some((100, 50, 0)));
        c.clear();
        assert_eq!(c.pixel(3, 3), Some((0, 0, 0)));
    }

    #[test]
    fn present_emits_one_row_per_pixel_pair() {
        let mut c = Canvas::new(4, 6, 4.0, 6.0, (0, 0, 0));
        let mut out = Vec::new();
        c.present(&mut out).expect("present");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("\x1b[H"));
        assert_eq!(text.matches('▄').count(), 12);
        assert_eq!(text.matches("\r\n").count(), 2);
    }
}
