use std::f64::consts::PI;

use crate::clipper::engine::{ClipType, Clipper, PolyFillType, PolyType};
use crate::clipper::int_point::{IntPath, IntPoint, orientation, round};

const DEFAULT_ARC_TOLERANCE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    Square,
    Round,
    #[default]
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Normal {
    x: f64,
    y: f64,
}

fn unit_normal(p1: IntPoint, p2: IntPoint) -> Normal {
    if p1 == p2 {
        return Normal::default();
    }
    let dx = (p2.x - p1.x) as f64;
    let dy = (p2.y - p1.y) as f64;
    let f = 1.0 / (dx * dx + dy * dy).sqrt();
    Normal { x: dy * f, y: -dx * f }
}

/// Grows or shrinks closed lattice paths by a signed distance.
///
/// Each path is offset edge by edge with the configured corner treatment and the raw rings are then
/// resolved with a union sweep, so self-overlaps introduced at concave corners disappear.
#[derive(Debug, Clone)]
pub struct ClipperOffset {
    pub miter_limit: f64,
    pub arc_tolerance: f64,
    paths: Vec<(IntPath, JoinType)>,
    /// (path index, vertex index) of the lowest vertex across all paths
    lowest: Option<(usize, usize)>,
}

/// Scratch state of one offset pass.
struct OffsetPass<'a> {
    src: &'a [IntPoint],
    normals: Vec<Normal>,
    dest: IntPath,
    delta: f64,
    sin_a: f64,
    sin: f64,
    cos: f64,
    miter_lim: f64,
    steps_per_rad: f64,
}

impl Default for ClipperOffset {
    fn default() -> Self {
        Self::new(2.0, DEFAULT_ARC_TOLERANCE)
    }
}

impl ClipperOffset {
    pub fn new(miter_limit: f64, arc_tolerance: f64) -> Self {
        ClipperOffset {
            miter_limit,
            arc_tolerance,
            paths: vec![],
            lowest: None,
        }
    }

    /// Adds a closed path. Consecutive duplicates are dropped; paths with fewer than three distinct
    /// vertices are ignored.
    pub fn add_path(&mut self, path: &[IntPoint], join_type: JoinType) {
        let mut high = path.len();
        while high > 1 && path[0] == path[high - 1] {
            high -= 1;
        }
        if high == 0 {
            return;
        }
        let mut contour: IntPath = Vec::with_capacity(high);
        contour.push(path[0]);
        let mut k = 0;
        for &p in &path[1..high] {
            if contour[contour.len() - 1] != p {
                contour.push(p);
                if p.y > contour[k].y || (p.y == contour[k].y && p.x < contour[k].x) {
                    k = contour.len() - 1;
                }
            }
        }
        if contour.len() < 3 {
            return;
        }
        let candidate = contour[k];
        self.lowest = match self.lowest {
            None => Some((self.paths.len(), k)),
            Some((pi, vi)) => {
                let ip = self.paths[pi].0[vi];
                if ip.y < candidate.y || (ip.y == candidate.y && ip.x > candidate.x) {
                    Some((self.paths.len(), k))
                } else {
                    Some((pi, vi))
                }
            }
        };
        self.paths.push((contour, join_type));
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.lowest = None;
    }

    /// Makes the path holding the lowest vertex an outer ring; all paths flip along with it.
    fn fix_orientations(&mut self) {
        if let Some((pi, _)) = self.lowest {
            if !orientation(&self.paths[pi].0) {
                for (p, _) in &mut self.paths {
                    p.reverse();
                }
            }
        }
    }

    fn raw_offset(&self, delta: f64) -> Vec<IntPath> {
        if delta.abs() < 1e-20 {
            return self.paths.iter().map(|(p, _)| p.clone()).collect();
        }
        let miter_lim = match self.miter_limit > 2.0 {
            true => 2.0 / (self.miter_limit * self.miter_limit),
            false => 0.5,
        };
        let y = if self.arc_tolerance <= 0.0 {
            DEFAULT_ARC_TOLERANCE
        } else if self.arc_tolerance > delta.abs() * DEFAULT_ARC_TOLERANCE {
            delta.abs() * DEFAULT_ARC_TOLERANCE
        } else {
            self.arc_tolerance
        };
        let mut steps = PI / (1.0 - y / delta.abs()).acos();
        if steps > delta.abs() * PI {
            steps = delta.abs() * PI;
        }
        let (mut sin, cos) = (2.0 * PI / steps).sin_cos();
        if delta < 0.0 {
            sin = -sin;
        }

        let mut out = Vec::with_capacity(self.paths.len());
        for (src, join_type) in &self.paths {
            let n = src.len();
            let mut normals = Vec::with_capacity(n);
            for j in 0..n {
                normals.push(unit_normal(src[j], src[(j + 1) % n]));
            }
            let mut pass = OffsetPass {
                src,
                normals,
                dest: Vec::with_capacity(n * 2),
                delta,
                sin_a: 0.0,
                sin,
                cos,
                miter_lim,
                steps_per_rad: steps / (2.0 * PI),
            };
            let mut k = n - 1;
            for j in 0..n {
                pass.offset_point(j, k, *join_type);
                k = j;
            }
            out.push(pass.dest);
        }
        out
    }

    /// Offsets every added path by `delta` (lattice units) and returns the resolved rings.
    pub fn execute(&mut self, delta: f64) -> Vec<IntPath> {
        self.fix_orientations();
        let raw = self.raw_offset(delta);
        let mut clipper = Clipper::new();
        clipper.add_paths(&raw, PolyType::Subject);
        if delta > 0.0 {
            clipper.execute(ClipType::Union, PolyFillType::Positive, PolyFillType::Positive)
        } else {
            let Some((lo, hi)) = clipper.bounds() else {
                return vec![];
            };
            let outer = [
                IntPoint::new(lo.x - 10, hi.y + 10),
                IntPoint::new(hi.x + 10, hi.y + 10),
                IntPoint::new(hi.x + 10, lo.y - 10),
                IntPoint::new(lo.x - 10, lo.y - 10),
            ];
            clipper.add_path(&outer, PolyType::Subject);
            clipper.reverse_output = true;
            let mut result = clipper.execute(ClipType::Union, PolyFillType::Negative, PolyFillType::Negative);
            // the enclosing frame comes out first
            if !result.is_empty() {
                result.remove(0);
            }
            result
        }
    }
}

impl OffsetPass<'_> {
    fn push(&mut self, x: f64, y: f64) {
        self.dest.push(IntPoint::new(round(x), round(y)));
    }

    fn offset_point(&mut self, j: usize, k: usize, join_type: JoinType) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let pj = self.src[j];
        let (px, py) = (pj.x as f64, pj.y as f64);
        self.sin_a = nk.x * nj.y - nj.x * nk.y;
        if (self.sin_a * self.delta).abs() < 1.0 {
            let cos_a = nk.x * nj.x + nj.y * nk.y;
            if cos_a > 0.0 {
                // nearly collinear edges, a single vertex is enough
                self.push(px + nk.x * self.delta, py + nk.y * self.delta);
                return;
            }
        } else {
            self.sin_a = self.sin_a.clamp(-1.0, 1.0);
        }

        if self.sin_a * self.delta < 0.0 {
            self.push(px + nk.x * self.delta, py + nk.y * self.delta);
            self.dest.push(pj);
            self.push(px + nj.x * self.delta, py + nj.y * self.delta);
            return;
        }
        match join_type {
            JoinType::Miter => {
                let r = 1.0 + (nj.x * nk.x + nj.y * nk.y);
                match r >= self.miter_lim {
                    true => self.do_miter(j, k, r),
                    false => self.do_square(j, k),
                }
            }
            JoinType::Square => self.do_square(j, k),
            JoinType::Round => self.do_round(j, k),
        }
    }

    fn do_square(&mut self, j: usize, k: usize) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let (px, py) = (self.src[j].x as f64, self.src[j].y as f64);
        let dx = (self.sin_a.atan2(nk.x * nj.x + nk.y * nj.y) / 4.0).tan();
        self.push(px + self.delta * (nk.x - nk.y * dx), py + self.delta * (nk.y + nk.x * dx));
        self.push(px + self.delta * (nj.x + nj.y * dx), py + self.delta * (nj.y - nj.x * dx));
    }

    fn do_miter(&mut self, j: usize, k: usize, r: f64) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let (px, py) = (self.src[j].x as f64, self.src[j].y as f64);
        let q = self.delta / r;
        self.push(px + (nk.x + nj.x) * q, py + (nk.y + nj.y) * q);
    }

    fn do_round(&mut self, j: usize, k: usize) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let (px, py) = (self.src[j].x as f64, self.src[j].y as f64);
        let a = self.sin_a.atan2(nk.x * nj.x + nk.y * nj.y);
        let steps = ((self.steps_per_rad * a.abs()).round() as i64).max(1);
        let (mut x, mut y) = (nk.x, nk.y);
        for _ in 0..steps {
            self.push(px + x * self.delta, py + y * self.delta);
            let x2 = x;
            x = x * self.cos - self.sin * y;
            y = x2 * self.sin + y * self.cos;
        }
        self.push(px + nj.x * self.delta, py + nj.y * self.delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::int_point::area;

    fn square(size: i64) -> IntPath {
        vec![
            IntPoint::new(0, 0),
            IntPoint::new(size, 0),
            IntPoint::new(size, size),
            IntPoint::new(0, size),
        ]
    }

    #[test]
    fn miter_grows_square_exactly() {
        let mut co = ClipperOffset::new(4.0, 0.25);
        co.add_path(&square(100), JoinType::Miter);
        let out = co.execute(10.0);
        assert_eq!(out.len(), 1);
        assert_eq!(area(&out[0]).abs(), 120.0 * 120.0);
    }

    #[test]
    fn negative_delta_shrinks() {
        let mut co = ClipperOffset::new(4.0, 0.25);
        co.add_path(&square(100), JoinType::Miter);
        let out = co.execute(-10.0);
        assert_eq!(out.len(), 1);
        assert_eq!(area(&out[0]).abs(), 80.0 * 80.0);
    }

    #[test]
    fn collapsing_shrink_yields_nothing() {
        let mut co = ClipperOffset::default();
        co.add_path(&square(10), JoinType::Miter);
        assert!(co.execute(-20.0).is_empty());
    }

    #[test]
    fn round_join_area_is_between_square_and_miter() {
        let mut co = ClipperOffset::new(2.0, 0.25);
        co.add_path(&square(1000), JoinType::Round);
        let out = co.execute(100.0);
        assert_eq!(out.len(), 1);
        let a = area(&out[0]).abs();
        let exact = 1000.0 * 1000.0 + 4.0 * 1000.0 * 100.0 + PI * 100.0 * 100.0;
        assert!((a - exact).abs() / exact < 0.01, "{a} vs {exact}");
    }
}
