//! Distance and contact queries between polygons that may be translated by an offset.
//!
//! Rings are open slices of [`Point`]s; the closing edge from the last vertex back to the first is implied.

use crate::geometry::Point;
use crate::geometry::polygon::on_segment;
use crate::util::{TOL, almost_equal};

#[inline]
fn eq(a: f64, b: f64) -> bool {
    almost_equal(a, b, TOL)
}

#[inline]
fn same(a: Point, b: Point) -> bool {
    a.almost_equal(&b, TOL)
}

/// Ray-casting containment of `p` in `ring` translated by `offset`. `None` when `p` lies on the boundary.
pub fn point_in_polygon(p: Point, ring: &[Point], offset: Point) -> Option<bool> {
    let n = ring.len();
    if n < 3 {
        return None;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i] + offset;
        let b = ring[j] + offset;
        if same(a, p) || on_segment(a, b, p, TOL) {
            return None;
        }
        if same(a, b) {
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

/// Intersection of segments `ab` and `ef`, or of the infinite lines through them when `infinite` is set.
pub fn line_intersect(a: Point, b: Point, e: Point, f: Point, infinite: bool) -> Option<Point> {
    let a1 = b.1 - a.1;
    let b1 = a.0 - b.0;
    let c1 = b.0 * a.1 - a.0 * b.1;
    let a2 = f.1 - e.1;
    let b2 = e.0 - f.0;
    let c2 = f.0 * e.1 - e.0 * f.1;
    let denom = a1 * b2 - a2 * b1;
    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    if !infinite {
        let outside = |lo: f64, hi: f64, v: f64| match lo < hi {
            true => v < lo || v > hi,
            false => v > lo || v < hi,
        };
        // coincident endpoints do not count
        if (a.0 - b.0).abs() > TOL && outside(a.0, b.0, x) {
            return None;
        }
        if (a.1 - b.1).abs() > TOL && outside(a.1, b.1, y) {
            return None;
        }
        if (e.0 - f.0).abs() > TOL && outside(e.0, f.0, x) {
            return None;
        }
        if (e.1 - f.1).abs() > TOL && outside(e.1, f.1, y) {
            return None;
        }
    }
    Some(Point(x, y))
}

/// Whether `p` coincides with any recorded NFP vertex.
pub fn in_nfp(p: Point, nfp: &[Vec<Point>]) -> bool {
    nfp.iter().flatten().any(|q| same(p, *q))
}

/// Whether the boundaries of `a` and `b` (each translated by its offset) cross.
/// Touching without crossing is not an intersection.
pub fn intersect(a: &[Point], a_off: Point, b: &[Point], b_off: Point) -> bool {
    let (na, nb) = (a.len(), b.len());
    let prev = |i: usize, n: usize| if i == 0 { n - 1 } else { i - 1 };
    let next = |i: usize, n: usize| (i + 1) % n;
    let crosses = |p0: Point, p2: Point, ring: &[Point], off: Point| {
        let (i0, i2) = (point_in_polygon(p0, ring, off), point_in_polygon(p2, ring, off));
        matches!((i0, i2), (Some(true), Some(false)) | (Some(false), Some(true)))
    };

    for i in 0..na {
        for j in 0..nb {
            let (i1, j1) = (next(i, na), next(j, nb));
            let a1 = a[i] + a_off;
            let a2 = a[i1] + a_off;
            let b1 = b[j] + b_off;
            let b2 = b[j1] + b_off;

            let mut pa = prev(i, na);
            let mut pb = prev(j, nb);
            let mut na3 = next(i1, na);
            let mut nb3 = next(j1, nb);
            // step past duplicated loop end points
            if same(b[pb], b[j]) {
                pb = prev(pb, nb);
            }
            if same(a[pa], a[i]) {
                pa = prev(pa, na);
            }
            if same(b[nb3], b[j1]) {
                nb3 = next(nb3, nb);
            }
            if same(a[na3], a[i1]) {
                na3 = next(na3, na);
            }
            let a0 = a[pa] + a_off;
            let b0 = b[pb] + b_off;
            let a3 = a[na3] + a_off;
            let b3 = b[nb3] + b_off;

            // a vertex lying on the other boundary crosses only if its neighbours are on opposite sides
            if on_segment(a1, a2, b1, TOL) || same(a1, b1) {
                if crosses(b0, b2, a, a_off) {
                    return true;
                }
                continue;
            }
            if on_segment(a1, a2, b2, TOL) || same(a2, b2) {
                if crosses(b1, b3, a, a_off) {
                    return true;
                }
                continue;
            }
            if on_segment(b1, b2, a1, TOL) || same(a1, b2) {
                if crosses(a0, a2, b, b_off) {
                    return true;
                }
                continue;
            }
            if on_segment(b1, b2, a2, TOL) || same(a2, b1) {
                if crosses(a1, a3, b, b_off) {
                    return true;
                }
                continue;
            }
            if line_intersect(b1, b2, a1, a2, false).is_some() {
                return true;
            }
        }
    }
    false
}

/// Signed distance `p` has to travel along `normal` to hit the line through `s1 s2`.
/// Outside `infinite` mode, points whose projection misses the segment yield `None`.
pub fn point_distance(p: Point, s1: Point, s2: Point, normal: Point, infinite: bool) -> Option<f64> {
    let normal = normal.normalized();
    let dir = Point(normal.1, -normal.0);

    let pdot = p.dot(&dir);
    let s1dot = s1.dot(&dir);
    let s2dot = s2.dot(&dir);
    let pdotnorm = p.dot(&normal);
    let s1dotnorm = s1.dot(&normal);
    let s2dotnorm = s2.dot(&normal);

    if !infinite {
        let le = |a: f64, b: f64| a < b || eq(a, b);
        let ge = |a: f64, b: f64| a > b || eq(a, b);
        if (le(pdot, s1dot) && le(pdot, s2dot)) || (ge(pdot, s1dot) && ge(pdot, s2dot)) {
            // misses the segment or lies right on a vertex
            return None;
        }
        if eq(pdot, s1dot) && eq(pdot, s2dot) {
            if pdotnorm > s1dotnorm && pdotnorm > s2dotnorm {
                return Some((pdotnorm - s1dotnorm).min(pdotnorm - s2dotnorm));
            }
            if pdotnorm < s1dotnorm && pdotnorm < s2dotnorm {
                return Some(-(s1dotnorm - pdotnorm).min(s2dotnorm - pdotnorm));
            }
        }
    }
    Some(-(pdotnorm - s1dotnorm + (s1dotnorm - s2dotnorm) * (s1dot - pdot) / (s1dot - s2dot)))
}

/// How far segment `ab` can move along `direction` before it runs into segment `ef`.
pub fn segment_distance(a: Point, b: Point, e: Point, f: Point, direction: Point) -> Option<f64> {
    let normal = Point(direction.1, -direction.0);
    let reverse = Point(-direction.0, -direction.1);

    let dot_a = a.dot(&normal);
    let dot_b = b.dot(&normal);
    let dot_e = e.dot(&normal);
    let dot_f = f.dot(&normal);

    let cross_a = a.dot(&direction);
    let cross_b = b.dot(&direction);
    let cross_e = e.dot(&direction);
    let cross_f = f.dot(&direction);

    let ab_min = dot_a.min(dot_b);
    let ab_max = dot_a.max(dot_b);
    let ef_max = dot_e.max(dot_f);
    let ef_min = dot_e.min(dot_f);

    // touching at a single point
    if eq(ab_max, ef_min) || eq(ab_min, ef_max) {
        return None;
    }
    // no overlap at all
    if ab_max < ef_min || ab_min > ef_max {
        return None;
    }

    let overlap = if (ab_max > ef_max && ab_min < ef_min) || (ef_max > ab_max && ef_min < ab_min) {
        1.0
    } else {
        let min_max = ab_max.min(ef_max);
        let max_min = ab_min.max(ef_min);
        let max_max = ab_max.max(ef_max);
        let min_min = ab_min.min(ef_min);
        (min_max - max_min) / (max_max - min_min)
    };

    let cross_abe = (e.1 - a.1) * (b.0 - a.0) - (e.0 - a.0) * (b.1 - a.1);
    let cross_abf = (f.1 - a.1) * (b.0 - a.0) - (f.0 - a.0) * (b.1 - a.1);

    // collinear
    if eq(cross_abe, 0.0) && eq(cross_abf, 0.0) {
        let ab_norm = Point(b.1 - a.1, a.0 - b.0).normalized();
        let ef_norm = Point(f.1 - e.1, e.0 - f.0).normalized();
        // normals must point in opposite directions
        if (ab_norm.1 * ef_norm.0 - ab_norm.0 * ef_norm.1).abs() < TOL && ab_norm.dot(&ef_norm) < 0.0 {
            let normdot = ab_norm.dot(&direction);
            // sliding along each other
            if eq(normdot, 0.0) {
                return None;
            }
            if normdot < 0.0 {
                return Some(0.0);
            }
        }
        return None;
    }

    let mut distances = Vec::with_capacity(4);

    // `moving` touches the other segment already: discard the contact when the segment moves away from it
    let touching_filter = |d: Option<f64>, other: Point, s1: Point, s2: Point, dir: Point| match d {
        Some(v) if eq(v, 0.0) => match point_distance(other, s1, s2, dir, true) {
            Some(d_other) if d_other < 0.0 || eq(d_other * overlap, 0.0) => None,
            _ => d,
        },
        _ => d,
    };

    if eq(dot_a, dot_e) {
        distances.push(cross_a - cross_e);
    } else if eq(dot_a, dot_f) {
        distances.push(cross_a - cross_f);
    } else if dot_a > ef_min && dot_a < ef_max {
        let d = point_distance(a, e, f, reverse, false);
        distances.extend(touching_filter(d, b, e, f, reverse));
    }

    if eq(dot_b, dot_e) {
        distances.push(cross_b - cross_e);
    } else if eq(dot_b, dot_f) {
        distances.push(cross_b - cross_f);
    } else if dot_b > ef_min && dot_b < ef_max {
        let d = point_distance(b, e, f, reverse, false);
        distances.extend(touching_filter(d, a, e, f, reverse));
    }

    if dot_e > ab_min && dot_e < ab_max {
        let d = point_distance(e, a, b, direction, false);
        distances.extend(touching_filter(d, f, a, b, direction));
    }

    if dot_f > ab_min && dot_f < ab_max {
        let d = point_distance(f, a, b, direction, false);
        distances.extend(touching_filter(d, e, a, b, direction));
    }

    distances.into_iter().reduce(f64::min)
}

fn closed_edges(ring: &[Point], offset: Point) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i] + offset, ring[(i + 1) % n] + offset))
}

/// Shortest distance `b` can slide along `direction` before colliding with `a`.
/// With `ignore_negative`, contacts behind the motion are skipped.
pub fn polygon_slide_distance(
    a: &[Point],
    a_off: Point,
    b: &[Point],
    b_off: Point,
    direction: Point,
    ignore_negative: bool,
) -> Option<f64> {
    let dir = direction.normalized();
    let mut distance: Option<f64> = None;
    for (b1, b2) in closed_edges(b, b_off) {
        if same(b1, b2) {
            continue;
        }
        for (a1, a2) in closed_edges(a, a_off) {
            // skip degenerate edges
            if same(a1, a2) {
                continue;
            }
            if let Some(d) = segment_distance(a1, a2, b1, b2, dir) {
                if distance.is_none_or(|cur| d < cur) && (!ignore_negative || d > 0.0 || eq(d, 0.0)) {
                    distance = Some(d);
                }
            }
        }
    }
    distance
}

/// Distance `b` must be projected along `direction` to clear `a`: the largest over all vertices of `b`
/// of the smallest projection onto an edge of `a`.
pub fn polygon_projection_distance(
    a: &[Point],
    a_off: Point,
    b: &[Point],
    b_off: Point,
    direction: Point,
) -> Option<f64> {
    let mut distance: Option<f64> = None;
    for &vb in b {
        let p = vb + b_off;
        let mut min_projection: Option<f64> = None;
        for (s1, s2) in closed_edges(a, a_off) {
            if ((s2.1 - s1.1) * direction.0 - (s2.0 - s1.0) * direction.1).abs() < TOL {
                continue;
            }
            if let Some(d) = point_distance(p, s1, s2, direction, false) {
                if min_projection.is_none_or(|m| d < m) {
                    min_projection = Some(d);
                }
            }
        }
        if let Some(m) = min_projection {
            if distance.is_none_or(|d| m > d) {
                distance = Some(m);
            }
        }
    }
    distance
}

/// Whether `b` at `offset` is on the requested side of `a` (inside or outside).
/// `None` when every vertex of `b` lies on the boundary of `a`, i.e. the polygons coincide.
fn b_inside(a: &[Point], b: &[Point], offset: Point) -> Option<bool> {
    b.iter().find_map(|&v| point_in_polygon(v + offset, a, Point(0.0, 0.0)))
}

/// Finds a translation of `b` that touches `a` without crossing it, lies on the requested side and
/// is not a vertex of an already traced loop. Vertices of `a` are marked as they are tried.
pub fn search_start_point(
    a: &[Point],
    marked: &mut [bool],
    b: &[Point],
    inside: bool,
    nfp: &[Vec<Point>],
) -> Option<Point> {
    let origin = Point(0.0, 0.0);
    let na = a.len();
    for i in 0..na {
        if marked[i] {
            continue;
        }
        marked[i] = true;
        for &vb in b {
            let mut offset = a[i] - vb;
            let b_in = b_inside(a, b, offset)?;
            if b_in == inside && !intersect(a, origin, b, offset) && !in_nfp(offset, nfp) {
                return Some(offset);
            }

            // slide b along the edge of a until it no longer overlaps
            let mut v = a[(i + 1) % na] - a[i];
            let d1 = polygon_projection_distance(a, origin, b, offset, v);
            let d2 = polygon_projection_distance(b, offset, a, origin, Point(-v.0, -v.1));
            let d = match (d1, d2) {
                (None, None) => None,
                (None, d) | (d, None) => d,
                (Some(x), Some(y)) => Some(x.min(y)),
            };
            let Some(d) = d.filter(|d| !eq(*d, 0.0) && *d > 0.0) else {
                continue;
            };
            let vd2 = v.dot(&v);
            if d * d < vd2 && !eq(d * d, vd2) {
                let vd = vd2.sqrt();
                v = Point(v.0 * d / vd, v.1 * d / vd);
            }
            offset = offset + v;

            let b_in = b_inside(a, b, offset).unwrap_or(b_in);
            if b_in == inside && !intersect(a, origin, b, offset) && !in_nfp(offset, nfp) {
                return Some(offset);
            }
        }
    }
    None
}
