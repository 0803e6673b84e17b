use crate::canvas::Canvas;
use crate::config::BombConfig;
use crate::geom::{Point, Rect};

/// Bomb body placement on the logical canvas.
#[derive(Debug, Clone)]
pub struct Bomb {
    center: Point,
    config: BombConfig,
}

impl Bomb {
    /// Centre the bomb horizontally, slightly below the middle.
    pub fn new(canvas_bounds: Rect, config: BombConfig) -> Self {
        let center = Point::new(
            canvas_bounds.x + canvas_bounds.width * 0.5,
            canvas_bounds.y + canvas_bounds.height * 0.5 + config.offset_y,
        );
        Self { center, config }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn cap(&self) -> Rect {
        let c = &self.config;
        Rect::new(
            self.center.x - c.cap_width * 0.5,
            self.center.y - c.radius - c.cap_height * 0.75,
            c.cap_width,
            c.cap_height,
        )
    }

    /// Where the fuse leaves the cap.
    pub fn fuse_anchor(&self) -> Point {
        let cap = self.cap();
        Point::new(self.center.x, cap.y)
    }

    pub fn render(&self, canvas: &mut Canvas) {
        let c = &self.config;
        let half_outline = c.outline_width * 0.5;
        canvas.fill_circle(self.center, c.radius + half_outline, c.outline_color, 1.0);
        canvas.fill_circle(self.center, (c.radius - half_outline).max(0.0), c.body_color, 1.0);
        canvas.fill_rect(self.cap(), c.cap_color, 1.0);

        // highlight
        let shine = Point::new(self.center.x - c.radius * 0.4, self.center.y - c.radius * 0.4);
        canvas.fill_circle(shine, c.radius * 0.12, c.outline_color, 0.6);
    }
}
