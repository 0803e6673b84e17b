//! Burning fuse renderer.
//!
//! The unburned rope is the prefix of the path from the bomb cap out to the
//! current burn point. The burn point sits at `(len - 1) * fraction` along the
//! path, measured in points rather than arc length, and is interpolated
//! between its two neighbours so the spark glides instead of hopping.

use crate::canvas::Canvas;
use crate::config::BurnConfig;
use crate::fuse::FusePath;
use crate::geom::Point;
use noise::{NoiseFn, Perlin};
use std::f64::consts::TAU;

/// Where the rope is currently cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnCut {
    /// Index of the last whole point still drawn
    pub last_whole: usize,
    /// Interpolated burn point between `last_whole` and the next point
    pub tip: Point,
}

/// Number of whole path points drawn at `fraction`. Zero once the fuse is
/// spent, the full length at 1.
pub fn drawn_len(len: usize, fraction: f32) -> usize {
    if len < 2 || !(fraction > 0.0) {
        return 0;
    }
    let idx = (len - 1) as f32 * fraction.min(1.0);
    (idx.floor() as usize).min(len - 1) + 1
}

pub fn cut(path: &FusePath, fraction: f32) -> Option<BurnCut> {
    let points = path.points();
    let n = drawn_len(points.len(), fraction);
    if n == 0 {
        return None;
    }

    let last_whole = n - 1;
    let idx = (points.len() - 1) as f32 * fraction.clamp(0.0, 1.0);
    let tip = match points.get(last_whole + 1) {
        Some(&next) => points[last_whole].lerp(next, (idx - last_whole as f32).clamp(0.0, 1.0)),
        None => points[last_whole],
    };

    Some(BurnCut { last_whole, tip })
}

pub struct BurnRenderer {
    config: BurnConfig,
    flicker: Perlin,
}

impl BurnRenderer {
    pub fn new(config: BurnConfig, seed: u32) -> Self {
        Self {
            config,
            flicker: Perlin::new(seed),
        }
    }

    /// Draw the rope remaining at `fraction` and the spark at its end.
    /// `now_ms` only drives the spark flicker.
    pub fn render(&self, path: &FusePath, fraction: f32, now_ms: u64, canvas: &mut Canvas) {
        let Some(cut) = cut(path, fraction) else {
            return;
        };

        let mut rope: Vec<Point> = path.points()[..=cut.last_whole].to_vec();
        if rope.last() != Some(&cut.tip) {
            rope.push(cut.tip);
        }

        self.stroke_rope(&rope, canvas);
        self.draw_spark(cut.tip, now_ms, canvas);
    }

    /// Whole rope, no spark. Shown while no countdown is running.
    pub fn render_unlit(&self, path: &FusePath, canvas: &mut Canvas) {
        if path.len() < 2 {
            return;
        }
        self.stroke_rope(path.points(), canvas);
    }

    fn stroke_rope(&self, rope: &[Point], canvas: &mut Canvas) {
        let c = &self.config;
        canvas.stroke_polyline(rope, c.rope_width, c.rope_color, None);
        canvas.stroke_polyline(rope, c.texture_width, c.texture_color, Some(c.dash));
    }

    fn draw_spark(&self, at: Point, now_ms: u64, canvas: &mut Canvas) {
        let c = &self.config;
        let t = now_ms as f64 / 1000.0;

        // Perlin output is roughly in [-1, 1]
        let glow_jitter = self.flicker.get([t * 7.0, 0.5]) as f32;
        let core_jitter = self.flicker.get([t * 11.0, 3.5]) as f32;

        let glow_radius = c.glow_radius * (1.0 + glow_jitter * 0.25);
        canvas.fill_circle(at, glow_radius, c.glow_color, c.glow_alpha);
        let core_radius = c.core_radius * (1.0 + core_jitter * 0.15);
        canvas.fill_circle(at, core_radius, c.core_color, 1.0);

        for i in 0..c.satellites {
            let p = self.satellite_position(at, i, now_ms);
            canvas.fill_circle(p, c.satellite_radius, c.satellite_color, 1.0);
        }
    }

    /// Centre of satellite `i` orbiting `at`. Continuous in `now_ms`.
    fn satellite_position(&self, at: Point, i: usize, now_ms: u64) -> Point {
        let c = &self.config;
        let t = now_ms as f64 / 1000.0;
        let spacing = TAU / c.satellites.max(1) as f64;

        let angle = (t * f64::from(c.satellite_speed) + i as f64 * spacing)
            .rem_euclid(TAU) as f32;
        let wobble = self.flicker.get([t * 5.0, i as f64 * 1.7 + 10.0]) as f32;
        let orbit = c.satellite_orbit * (1.0 + wobble * 0.3);
        Point::new(at.x + angle.cos() * orbit, at.y + angle.sin() * orbit)
    }
}
