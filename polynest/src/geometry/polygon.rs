use crate::geometry::geo_traits::{Shape, Transformable};
use crate::geometry::{BoundRect, Point};
use crate::util::fpa::almost_equal;

/// Open polygon (first vertex not repeated) stored as a flat `[x0, y0, x1, y1, ...]` buffer.
///
/// The sign of [`Shape::area`] encodes the winding: negative means counter-clockwise in a y-up frame.
/// Holes are kept in `children`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    coords: Vec<f64>,
    bounds: Option<BoundRect>,
    pub children: Vec<Polygon>,
}

impl Polygon {
    pub fn new(coords: Vec<f64>) -> Self {
        debug_assert!(coords.len() % 2 == 0);
        let mut p = Polygon { coords, bounds: None, children: vec![] };
        p.rebind();
        p
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let coords = points.into_iter().flat_map(|Point(x, y)| [x, y]).collect();
        Polygon::new(coords)
    }

    /// Axis-aligned rectangle with its first vertex at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Polygon::new(vec![x, y, x + width, y, x + width, y + height, x, y + height])
    }

    pub fn with_children(mut self, children: Vec<Polygon>) -> Self {
        self.children = children;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() >> 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Vertex `i`, wrapping around the ring.
    #[inline]
    pub fn at(&self, i: usize) -> Point {
        let i = (i % self.len()) << 1;
        Point(self.coords[i], self.coords[i + 1])
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        self.coords.chunks_exact(2).map(|c| Point(c[0], c[1]))
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn into_coords(self) -> Vec<f64> {
        self.coords
    }

    /// Recomputes the cached bounds after the buffer changed.
    fn rebind(&mut self) {
        self.bounds = BoundRect::from_points(self.points());
    }

    pub fn reverse(&mut self) -> &mut Self {
        let n = self.len();
        for i in 0..n / 2 {
            let j = n - 1 - i;
            self.coords.swap(2 * i, 2 * j);
            self.coords.swap(2 * i + 1, 2 * j + 1);
        }
        self
    }

    /// Rotated copy with refreshed bounds; children are rotated along.
    pub fn rotated(&self, degrees: f64) -> Polygon {
        let mut p = self.clone();
        p.rotate(degrees);
        p
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        let mut p = self.clone();
        p.translate(dx, dy);
        p
    }

    /// Whether the polygon is an axis-aligned rectangle within `tolerance`.
    ///
    /// Every vertex lies on the bounding box and the polygon covers all of it, which rules out
    /// right triangles and other shapes whose corners merely touch the box.
    pub fn is_rectangle(&self, tolerance: f64) -> bool {
        let Some(bb) = self.bounds else { return false };
        let on_bounds = self.points().all(|Point(x, y)| {
            (almost_equal(x, bb.x, tolerance) || almost_equal(x, bb.x_max(), tolerance))
                && (almost_equal(y, bb.y, tolerance) || almost_equal(y, bb.y_max(), tolerance))
        });
        on_bounds && almost_equal(self.area().abs(), bb.area(), tolerance * (bb.width + bb.height))
    }

    /// Ray-casting containment. `None` when `p` lies on a vertex or an edge.
    pub fn point_in(&self, p: Point, tolerance: f64) -> Option<bool> {
        let n = self.len();
        if n < 3 {
            return None;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.at(i), self.at(j));
            if a.almost_equal(&p, tolerance) || on_segment(a, b, p, tolerance) {
                return None;
            }
            if almost_equal(a.0, b.0, tolerance) && almost_equal(a.1, b.1, tolerance) {
                j = i;
                continue;
            }
            if (a.1 > p.1) != (b.1 > p.1) && p.0 < (b.0 - a.0) * (p.1 - a.1) / (b.1 - a.1) + a.0 {
                inside = !inside;
            }
            j = i;
        }
        Some(inside)
    }

    pub fn is_convex(&self) -> bool {
        let n = self.len();
        if n < 4 {
            return true;
        }
        let mut sign = 0.0;
        for i in 0..n {
            let (a, b, c) = (self.at(i), self.at(i + 1), self.at(i + 2));
            let z = (b - a).cross(&(c - b));
            if z.abs() < crate::util::TOL {
                continue;
            }
            if sign == 0.0 {
                sign = z.signum();
            } else if z.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// True when `p` lies strictly between `a` and `b` on segment `ab` (endpoints excluded).
pub fn on_segment(a: Point, b: Point, p: Point, tolerance: f64) -> bool {
    // vertical
    if almost_equal(a.0, b.0, tolerance) && almost_equal(p.0, a.0, tolerance) {
        return !almost_equal(p.1, b.1, tolerance)
            && !almost_equal(p.1, a.1, tolerance)
            && p.1 < a.1.max(b.1)
            && p.1 > a.1.min(b.1);
    }
    // horizontal
    if almost_equal(a.1, b.1, tolerance) && almost_equal(p.1, a.1, tolerance) {
        return !almost_equal(p.0, b.0, tolerance)
            && !almost_equal(p.0, a.0, tolerance)
            && p.0 < a.0.max(b.0)
            && p.0 > a.0.min(b.0);
    }
    // range check
    if (p.0 < a.0 && p.0 < b.0) || (p.0 > a.0 && p.0 > b.0) || (p.1 < a.1 && p.1 < b.1) || (p.1 > a.1 && p.1 > b.1) {
        return false;
    }
    // exclude end points
    if p.almost_equal(&a, tolerance) || p.almost_equal(&b, tolerance) {
        return false;
    }
    let cross = (p.1 - a.1) * (b.0 - a.0) - (p.0 - a.0) * (b.1 - a.1);
    if cross.abs() > tolerance {
        return false;
    }
    let dot = (p.0 - a.0) * (b.0 - a.0) + (p.1 - a.1) * (b.1 - a.1);
    if dot < 0.0 || almost_equal(dot, 0.0, tolerance) {
        return false;
    }
    let len2 = a.sq_distance(&b);
    !(dot > len2 || almost_equal(dot, len2, tolerance))
}

impl Shape for Polygon {
    /// Shoelace sum, negative for counter-clockwise rings.
    fn area(&self) -> f64 {
        let n = self.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (self.at(i), self.at(j));
            area += (pj.0 + pi.0) * (pj.1 - pi.1);
            j = i;
        }
        0.5 * area
    }

    fn bound_rect(&self) -> BoundRect {
        self.bounds.unwrap_or_default()
    }
}

impl Transformable for Polygon {
    fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        for c in self.coords.chunks_exact_mut(2) {
            c[0] += dx;
            c[1] += dy;
        }
        for child in &mut self.children {
            child.translate(dx, dy);
        }
        self.bounds = self.bounds.map(|b| b.translated(dx, dy));
        self
    }

    fn rotate(&mut self, degrees: f64) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        for c in self.coords.chunks_exact_mut(2) {
            let (x, y) = (c[0], c[1]);
            c[0] = x * cos - y * sin;
            c[1] = x * sin + y * cos;
        }
        for child in &mut self.children {
            child.rotate(degrees);
        }
        self.rebind();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversing_negates_area() {
        let mut p = Polygon::from_points([Point(0.0, 0.0), Point(4.0, 0.0), Point(4.0, 3.0), Point(1.0, 5.0)]);
        let a = p.area();
        p.reverse();
        assert!(almost_equal(a, -p.area(), 1e-12));
        assert!(a != 0.0);
    }

    #[test]
    fn rectangle_detection() {
        assert!(Polygon::rectangle(1.0, 2.0, 3.0, 4.0).is_rectangle(1e-9));
        let tri = Polygon::from_points([Point(0.0, 0.0), Point(1.0, 0.0), Point(0.0, 1.0)]);
        assert!(!tri.is_rectangle(1e-9));
    }

    #[test]
    fn right_triangle_bin_is_not_a_rectangle() {
        let tri = Polygon::from_points([Point(0.0, 0.0), Point(100.0, 0.0), Point(0.0, 100.0)]);
        assert!(!tri.is_rectangle(1e-9));
        assert!(!tri.is_rectangle(0.1));
        let collinear = Polygon::from_points([
            Point(0.0, 0.0),
            Point(5.0, 0.0),
            Point(10.0, 0.0),
            Point(10.0, 4.0),
            Point(0.0, 4.0),
        ]);
        assert!(collinear.is_rectangle(1e-9));
    }

    #[test]
    fn bounds_follow_rotation() {
        let p = Polygon::rectangle(0.0, 0.0, 10.0, 2.0).rotated(90.0);
        let bb = p.bound_rect();
        assert!(almost_equal(bb.width, 2.0, 1e-9));
        assert!(almost_equal(bb.height, 10.0, 1e-9));
        assert!(almost_equal(bb.x, -2.0, 1e-9));
    }

    #[test]
    fn point_in_cases() {
        let sq = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        assert_eq!(sq.point_in(Point(5.0, 5.0), 1e-9), Some(true));
        assert_eq!(sq.point_in(Point(11.0, 5.0), 1e-9), Some(false));
        assert_eq!(sq.point_in(Point(10.0, 5.0), 1e-9), None);
        assert_eq!(sq.point_in(Point(0.0, 0.0), 1e-9), None);
    }
}
