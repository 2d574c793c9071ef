use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::clipper::{self, ClipType, Clipper, IntPath, IntPoint, PolyFillType, PolyType, scale_down, scale_up};
use crate::geometry::geo_traits::{Shape, Transformable};
use crate::geometry::{Point, Polygon};

/// Convex hull (Andrew's monotone chain), counter-clockwise in a y-up frame.
pub fn polygon_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pts.dedup_by(|a, b| a.almost_equal(b, crate::util::TOL));
    if pts.len() < 3 {
        return pts;
    }
    let turn = |o: Point, a: Point, b: Point| (a - o).cross(&(b - o));
    let mut lower: Vec<Point> = vec![];
    for &p in &pts {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = vec![];
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Lattice Minkowski sum of a closed `pattern` swept along a closed `path`:
/// one quad per pair of consecutive vertices, merged by a non-zero union.
fn minkowski_sum(pattern: &[IntPoint], path: &[IntPoint]) -> Vec<IntPath> {
    let swept: Vec<IntPath> = path
        .iter()
        .map(|q| pattern.iter().map(|p| IntPoint::new(p.x + q.x, p.y + q.y)).collect())
        .collect();
    let (n_path, n_pat) = (swept.len(), pattern.len());
    let mut clipper = Clipper::new();
    for i in 0..n_path {
        for j in 0..n_pat {
            let (i1, j1) = ((i + 1) % n_path, (j + 1) % n_pat);
            let mut quad = vec![swept[i][j], swept[i1][j], swept[i1][j1], swept[i][j1]];
            if !clipper::orientation(&quad) {
                quad.reverse();
            }
            clipper.add_path(&quad, PolyType::Subject);
        }
    }
    clipper.execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
}

/// Outer NFP of `b` around `a` as the Minkowski sum of `a` and `-b`, referenced to the first vertex of `b`.
///
/// Convex pairs take the hull of the pairwise vertex differences. Otherwise the sum is built on the lattice
/// and its largest loop is kept, which bounds every touching position but drops interior pockets.
pub fn minkowski_difference(a: &Polygon, b: &Polygon, scale: f64) -> Vec<Polygon> {
    if a.len() < 3 || b.len() < 3 {
        return vec![];
    }
    let b0 = b.at(0);
    let mut nfp = if a.is_convex() && b.is_convex() {
        let diffs = a.points().cartesian_product(b.points().collect_vec()).map(|(pa, pb)| pa - pb).collect_vec();
        Polygon::from_points(polygon_hull(&diffs))
    } else {
        let neg_b: IntPath = scale_up(b, scale).into_iter().map(|p| IntPoint::new(-p.x, -p.y)).collect();
        let sum = minkowski_sum(&scale_up(a, scale), &neg_b);
        match sum.iter().max_by_key(|p| OrderedFloat(clipper::area(p).abs())) {
            Some(largest) => scale_down(largest, scale),
            None => return vec![],
        }
    };
    nfp.translate(b0.0, b0.1);
    match nfp.area().abs() > 0.0 {
        true => vec![nfp],
        false => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::CLIPPER_SCALE;
    use float_cmp::approx_eq;

    #[test]
    fn hull_of_square_with_inner_point() {
        let pts = [Point(0.0, 0.0), Point(2.0, 0.0), Point(1.0, 1.0), Point(2.0, 2.0), Point(0.0, 2.0)];
        assert_eq!(polygon_hull(&pts).len(), 4);
    }

    #[test]
    fn convex_difference_of_squares() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(0.0, 0.0, 5.0, 5.0);
        let nfp = minkowski_difference(&a, &b, CLIPPER_SCALE);
        assert_eq!(nfp.len(), 1);
        assert!(approx_eq!(f64, nfp[0].area().abs(), 225.0, epsilon = 1e-6));
        let r = nfp[0].bound_rect();
        assert!(approx_eq!(f64, r.x, -5.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, r.y, -5.0, epsilon = 1e-9));
    }

    #[test]
    fn concave_difference_encloses_convex_hull_area() {
        let l = Polygon::new(vec![0.0, 0.0, 20.0, 0.0, 20.0, 5.0, 5.0, 5.0, 5.0, 15.0, 0.0, 15.0]);
        let b = Polygon::rectangle(0.0, 0.0, 2.0, 2.0);
        let nfp = minkowski_difference(&l, &b, CLIPPER_SCALE);
        assert_eq!(nfp.len(), 1);
        // L grown by 2 on the lower-left sides: every touching position lies within
        assert!(nfp[0].area().abs() > l.area().abs());
    }
}
