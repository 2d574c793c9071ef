use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::geometry::geo_traits::Transformable;
use crate::util::fpa::almost_equal;

/// Geometric primitive representing a point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

impl Point {
    #[inline]
    pub fn x(&self) -> f64 {
        self.0
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.1
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.0 * other.0 + self.1 * other.1
    }

    pub fn cross(&self, other: &Point) -> f64 {
        self.0 * other.1 - self.1 * other.0
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(&self) -> Point {
        let len = self.length();
        match almost_equal(len * len, 1.0, crate::util::TOL) {
            true => *self,
            false => Point(self.0 / len, self.1 / len),
        }
    }

    pub fn almost_equal(&self, other: &Point, tolerance: f64) -> bool {
        almost_equal(self.0, other.0, tolerance) && almost_equal(self.1, other.1, tolerance)
    }

    pub fn sq_distance(&self, other: &Point) -> f64 {
        (self.0 - other.0).powi(2) + (self.1 - other.1).powi(2)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.sq_distance(other).sqrt()
    }
}

impl Transformable for Point {
    fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.0 += dx;
        self.1 += dy;
        self
    }

    fn rotate(&mut self, degrees: f64) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let Point(x, y) = *self;
        self.0 = x * cos - y * sin;
        self.1 = x * sin + y * cos;
        self
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point(self.0 - rhs.0, self.1 - rhs.1)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.0, p.1)
    }
}

impl From<(f64, f64)> for Point {
    fn from(p: (f64, f64)) -> Self {
        Point(p.0, p.1)
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Point(p[0], p[1])
    }
}
