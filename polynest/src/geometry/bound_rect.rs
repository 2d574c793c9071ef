use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Axis-aligned bounding rectangle: position plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BoundRect { x, y, width, height }
    }

    /// Extrema of the points, or `None` for an empty set.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.0, first.1, first.0, first.1);
        for Point(x, y) in it {
            x_min = x_min.min(x);
            y_min = y_min.min(y);
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
        Some(BoundRect::new(x_min, y_min, x_max - x_min, y_max - y_min))
    }

    pub fn x_max(&self) -> f64 {
        self.x + self.width
    }

    pub fn y_max(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn union(&self, other: &BoundRect) -> BoundRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundRect::new(x, y, self.x_max().max(other.x_max()) - x, self.y_max().max(other.y_max()) - y)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> BoundRect {
        BoundRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
