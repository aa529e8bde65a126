//! Small 2D geometry primitives used by the gap computations.
//!
//! Coordinates are in pixels, y growing downwards (image convention).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A line segment from `p1` to `p2`.  Stem medians are stored top-down (`p1.y <= p2.y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2D {
    pub p1: Point2D,
    pub p2: Point2D,
}

impl Line2D {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            p1: Point2D::new(x1, y1),
            p2: Point2D::new(x2, y2),
        }
    }

    /// Abscissa of the (extended) line at the given ordinate.  Vertical spans fall back to `p1.x`.
    pub fn x_at_y(&self, y: f64) -> f64 {
        let dy = self.p2.y - self.p1.y;
        if dy.abs() < f64::EPSILON {
            return self.p1.x;
        }
        self.p1.x + (y - self.p1.y) * (self.p2.x - self.p1.x) / dy
    }

    /// Ordinate of the (extended) line at the given abscissa.  Horizontal spans fall back to `p1.y`.
    pub fn y_at_x(&self, x: f64) -> f64 {
        let dx = self.p2.x - self.p1.x;
        if dx.abs() < f64::EPSILON {
            return self.p1.y;
        }
        self.p1.y + (x - self.p1.x) * (self.p2.y - self.p1.y) / dx
    }

    /// Where `point` lies relative to the directed line `p1 -> p2`: `-1`, `0` or `+1` depending on
    /// the sign of the cross product (the `java.awt` `relativeCCW` convention)
    pub fn relative_ccw(&self, point: Point2D) -> i32 {
        let (vx, vy) = (self.p2.x - self.p1.x, self.p2.y - self.p1.y);
        let (px, py) = (point.x - self.p1.x, point.y - self.p1.y);
        let cross = px * vy - py * vx;
        if cross > 0.0 {
            1
        } else if cross < 0.0 {
            -1
        } else {
            0
        }
    }

    pub fn mid_y(&self) -> f64 {
        (self.p1.y + self.p2.y) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_at_y() {
        let line = Line2D::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(line.x_at_y(10.0), 5.0);
        // Vertical line falls back to p1.x
        let vertical = Line2D::new(3.0, 0.0, 3.0, 20.0);
        assert_eq!(vertical.x_at_y(7.0), 3.0);
    }

    #[test]
    fn relative_ccw() {
        // Downwards line (image convention): points to its left have x smaller than the line
        let down = Line2D::new(5.0, 0.0, 5.0, 10.0);
        assert_eq!(down.relative_ccw(Point2D::new(0.0, 5.0)), -1);
        assert_eq!(down.relative_ccw(Point2D::new(10.0, 5.0)), 1);
        assert_eq!(down.relative_ccw(Point2D::new(5.0, 5.0)), 0);
    }
}
