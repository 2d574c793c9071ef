use serde::{Deserialize, Serialize};

/// Point on the integer lattice the sweep operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntPoint {
    pub x: i64,
    pub y: i64,
}

pub type IntPath = Vec<IntPoint>;

impl IntPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        IntPoint { x, y }
    }
}

/// Rounds half away from zero, the way the lattice conversions expect.
#[inline]
pub fn round(v: f64) -> i64 {
    if v < 0.0 {
        (v - 0.5) as i64
    } else {
        (v + 0.5) as i64
    }
}

/// Signed area of an integer path. Positive for an "outer" orientation in lattice space.
pub fn area(path: &[IntPoint]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        a += (path[j].x as f64 + path[i].x as f64) * (path[j].y as f64 - path[i].y as f64);
        j = i;
    }
    -a * 0.5
}

pub fn orientation(path: &[IntPoint]) -> bool {
    area(path) >= 0.0
}

#[inline]
pub(crate) fn slopes_equal3(p1: IntPoint, p2: IntPoint, p3: IntPoint) -> bool {
    (p1.y - p2.y) as i128 * (p2.x - p3.x) as i128 == (p1.x - p2.x) as i128 * (p2.y - p3.y) as i128
}

#[inline]
pub(crate) fn slopes_equal4(p1: IntPoint, p2: IntPoint, p3: IntPoint, p4: IntPoint) -> bool {
    (p1.y - p2.y) as i128 * (p3.x - p4.x) as i128 == (p1.x - p2.x) as i128 * (p3.y - p4.y) as i128
}

pub(crate) fn pt2_is_between_pt1_and_pt3(p1: IntPoint, p2: IntPoint, p3: IntPoint) -> bool {
    if p1 == p3 || p1 == p2 || p3 == p2 {
        false
    } else if p1.x != p3.x {
        (p2.x > p1.x) == (p2.x < p3.x)
    } else {
        (p2.y > p1.y) == (p2.y < p3.y)
    }
}

/// Ray-crossing test on a lattice path.
/// Returns 0 when outside, 1 when inside and -1 when `pt` lies on the boundary.
pub fn point_in_path(pt: IntPoint, path: &[IntPoint]) -> i32 {
    let cnt = path.len();
    if cnt < 3 {
        return 0;
    }
    let mut result = 0;
    let mut ip = path[0];
    for i in 1..=cnt {
        let ip_next = if i == cnt { path[0] } else { path[i] };
        if let Some(r) = crossing_step(pt, ip, ip_next, &mut result) {
            return r;
        }
        ip = ip_next;
    }
    result
}

/// One edge of the crossing-number walk, shared by the path and ring variants.
#[inline]
pub(crate) fn crossing_step(pt: IntPoint, p0: IntPoint, p1: IntPoint, result: &mut i32) -> Option<i32> {
    if p1.y == pt.y && (p1.x == pt.x || (p0.y == pt.y && ((p1.x > pt.x) == (p0.x < pt.x)))) {
        return Some(-1);
    }
    if (p0.y < pt.y) != (p1.y < pt.y) {
        if p0.x >= pt.x {
            if p1.x > pt.x {
                *result = 1 - *result;
            } else {
                let d = cross_d(pt, p0, p1);
                if d == 0 {
                    return Some(-1);
                }
                if (d > 0) == (p1.y > p0.y) {
                    *result = 1 - *result;
                }
            }
        } else if p1.x > pt.x {
            let d = cross_d(pt, p0, p1);
            if d == 0 {
                return Some(-1);
            }
            if (d > 0) == (p1.y > p0.y) {
                *result = 1 - *result;
            }
        }
    }
    None
}

#[inline]
fn cross_d(pt: IntPoint, p0: IntPoint, p1: IntPoint) -> i128 {
    (p0.x - pt.x) as i128 * (p1.y - pt.y) as i128 - (p1.x - pt.x) as i128 * (p0.y - pt.y) as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(s: i64) -> IntPath {
        vec![
            IntPoint::new(0, 0),
            IntPoint::new(s, 0),
            IntPoint::new(s, s),
            IntPoint::new(0, s),
        ]
    }

    #[test]
    fn area_sign_flips_with_reversal() {
        let mut sq = square(10);
        let a = area(&sq);
        sq.reverse();
        assert_eq!(a, -area(&sq));
        assert_eq!(a.abs(), 100.0);
    }

    #[test]
    fn point_in_path_cases() {
        let sq = square(10);
        assert_eq!(point_in_path(IntPoint::new(5, 5), &sq), 1);
        assert_eq!(point_in_path(IntPoint::new(15, 5), &sq), 0);
        assert_eq!(point_in_path(IntPoint::new(10, 5), &sq), -1);
        assert_eq!(point_in_path(IntPoint::new(0, 0), &sq), -1);
    }

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(-2.5), -3);
        assert_eq!(round(-2.4), -2);
    }
}
