//! Procedural fuse rope.
//!
//! The rope is a random walk that starts with a short vertical stem on top of
//! the bomb cap and then wanders with a slowly drifting heading. When a step
//! would leave the boundary rectangle the heading snaps toward the interior
//! and the step is still taken, so the rope bounces off the edges instead of
//! being clipped.

use crate::config::FuseConfig;
use crate::geom::{Point, Rect};
use std::f32::consts::{FRAC_PI_2, PI};
use tracing::debug;

/// Ordered rope points. Index 0 sits on the bomb cap, the last point is the
/// free end where the burn starts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FusePath {
    points: Vec<Point>,
}

impl FusePath {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn attachment(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn tip(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Walk `steps` times from a stem above `origin`, keeping roughly inside
/// `bounds`. The result always has `steps + 2` points.
pub fn generate(
    origin: Point,
    bounds: Rect,
    steps: usize,
    config: &FuseConfig,
    rng: &mut fastrand::Rng,
) -> FusePath {
    let mut points = Vec::with_capacity(steps + 2);
    points.push(origin);

    let mut pos = Point::new(origin.x, origin.y - config.stem_length);
    points.push(pos);

    let mut angle = -FRAC_PI_2; // straight up
    let step_span = (config.step_max - config.step_min).max(0.0);

    for _ in 0..steps {
        angle += (rng.f32() - 0.5) * config.turn;

        let len = config.step_min + rng.f32() * step_span;
        let mut next = Point::new(pos.x + angle.cos() * len, pos.y + angle.sin() * len);

        if !bounds.contains(next) {
            angle = bounce_heading(next, &bounds, angle);
            next = Point::new(pos.x + angle.cos() * len, pos.y + angle.sin() * len);
        }

        pos = next;
        points.push(pos);
    }

    debug!(points = points.len(), "generated fuse path");
    FusePath { points }
}

/// Heading pointing back into `bounds` from an escaping point.
fn bounce_heading(p: Point, bounds: &Rect, current: f32) -> f32 {
    if p.x < bounds.x {
        0.0
    } else if p.x > bounds.right() {
        PI
    } else if p.y < bounds.y {
        FRAC_PI_2
    } else if p.y > bounds.bottom() {
        -FRAC_PI_2
    } else {
        current
    }
}
