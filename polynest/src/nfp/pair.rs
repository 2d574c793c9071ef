use log::{debug, warn};

use crate::cache::NfpKey;
use crate::clipper::CLIPPER_SCALE;
use crate::entities::PolygonNode;
use crate::geometry::Polygon;
use crate::geometry::geo_traits::Shape;
use crate::nfp::minkowski::minkowski_difference;
use crate::nfp::orbit::{no_fit_polygon, strictly_inside};
use crate::nfp::rect::no_fit_polygon_rectangle;
use crate::util::{PackedConfig, assertions};

/// Relative tolerance for recognising a rectangular bin
const RECTANGLE_TOLERANCE: f64 = 0.001;

/// Request for the NFP of `b` relative to `a`, both taken at their own rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PairJob {
    pub config: PackedConfig,
    pub key: NfpKey,
    pub a: PolygonNode,
    pub b: PolygonNode,
}

/// Loops of one NFP. Empty when the pair has no feasible relative position or the computation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub key: NfpKey,
    pub loops: Vec<Polygon>,
}

impl PairResult {
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

/// Computes the NFP requested by `job` and normalises its loops.
///
/// Inner NFPs wind with negative area. Outer NFPs keep their largest loop first with negative area;
/// later loops inside it are holes (positive area). With `use_holes`, inner NFPs of the holes of `a`
/// that `b` fits into are appended as positive loops.
pub fn pair_nfp(job: &PairJob) -> PairResult {
    let a = job.a.rotated();
    let b = job.b.rotated();
    let explore = job.config.explore_concave;

    let loops = match job.key.inside() {
        true => inner_nfp(&a, &b, explore),
        false => outer_nfp(&a, &b, explore, job.config.use_holes),
    };
    let loops = match loops {
        Some(l) => l,
        None => {
            debug!("[NFP] no result for {}", job.key);
            vec![]
        }
    };
    debug_assert!(assertions::nfp_loops_valid(&loops));
    PairResult { key: job.key, loops }
}

fn inner_nfp(a: &PolygonNode, b: &PolygonNode, explore: bool) -> Option<Vec<Polygon>> {
    let mut loops = match a.polygon.is_rectangle(RECTANGLE_TOLERANCE) {
        true => no_fit_polygon_rectangle(&a.polygon, &b.polygon, true)?,
        false => no_fit_polygon(&a.polygon, &b.polygon, true, explore)?,
    };
    for l in &mut loops {
        if l.area() > 0.0 {
            l.reverse();
        }
    }
    Some(loops)
}

fn outer_nfp(a: &PolygonNode, b: &PolygonNode, explore: bool, use_holes: bool) -> Option<Vec<Polygon>> {
    let mut loops = if explore {
        no_fit_polygon(&a.polygon, &b.polygon, false, true)?
    } else if a.polygon.is_rectangle(RECTANGLE_TOLERANCE) && b.polygon.is_rectangle(RECTANGLE_TOLERANCE) {
        no_fit_polygon_rectangle(&a.polygon, &b.polygon, false)?
    } else {
        minkowski_difference(&a.polygon, &b.polygon, CLIPPER_SCALE)
    };
    if loops.is_empty() {
        warn!("[NFP] outer NFP of {} around {} is empty", b.source, a.source);
        return None;
    }

    // a valid outer NFP encloses A; with explored edges only the first loop has to
    let checked = if explore { 1 } else { loops.len() };
    if let Some(small) = loops[..checked]
        .iter()
        .find(|l| !assertions::outer_nfp_encloses(l, &a.polygon))
    {
        warn!(
            "[NFP] outer NFP of {} around {} smaller than A ({:.3} < {:.3}), discarded",
            b.source,
            a.source,
            small.area().abs(),
            a.polygon.area().abs()
        );
        return None;
    }

    for l in &mut loops {
        if l.area() > 0.0 {
            l.reverse();
        }
    }
    for i in 1..loops.len() {
        if strictly_inside(loops[i].at(0), &loops[0]) {
            loops[i].reverse();
        }
    }

    if use_holes && !a.children.is_empty() {
        let rb = b.polygon.bound_rect();
        for hole in &a.children {
            let rh = hole.polygon.bound_rect();
            if rh.width <= rb.width || rh.height <= rb.height {
                continue;
            }
            let Some(hole_loops) = no_fit_polygon(&hole.polygon, &b.polygon, true, explore) else {
                continue;
            };
            for mut l in hole_loops {
                if l.area() < 0.0 {
                    l.reverse();
                }
                loops.push(l);
            }
        }
    }
    Some(loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NfpKey;
    use float_cmp::approx_eq;
    use test_case::test_case;

    fn node(source: i32, rotation: f64, polygon: Polygon) -> PolygonNode {
        PolygonNode::new(source, rotation, polygon)
    }

    #[test]
    fn inner_nfp_of_rectangular_bin_is_negative() {
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 0, true, 0, 0),
            a: node(-1, 0.0, Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
            b: node(0, 0.0, Polygon::rectangle(0.0, 0.0, 40.0, 40.0)),
        };
        let res = pair_nfp(&job);
        assert_eq!(res.loops.len(), 1);
        assert!(res.loops[0].area() < 0.0);
        assert!(approx_eq!(f64, res.loops[0].area().abs(), 3600.0, epsilon = 1e-6));
    }

    #[test]
    fn oversized_part_yields_empty_inner_nfp() {
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 0, true, 0, 0),
            a: node(-1, 0.0, Polygon::rectangle(0.0, 0.0, 10.0, 10.0)),
            b: node(0, 0.0, Polygon::rectangle(0.0, 0.0, 20.0, 20.0)),
        };
        assert!(pair_nfp(&job).is_empty());
    }

    #[test_case(60.0; "square_too_large")]
    #[test_case(30.0; "square_fits")]
    fn inner_nfp_of_triangular_bin_stays_inside(size: f64) {
        let bin = Polygon::new(vec![0.0, 0.0, 100.0, 0.0, 0.0, 100.0]);
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 0, true, 0, 0),
            a: node(-1, 0.0, bin),
            b: node(0, 0.0, Polygon::rectangle(0.0, 0.0, size, size)),
        };
        // reference is the square's lower left corner: x, y >= 0 and x + y + 2 * size <= 100
        let res = pair_nfp(&job);
        for l in &res.loops {
            for p in l.points() {
                assert!(p.0 >= -1e-6 && p.1 >= -1e-6, "{p:?} leaves the bin");
                assert!(p.0 + p.1 <= 100.0 - 2.0 * size + 1e-6, "{p:?} crosses the hypotenuse");
            }
        }
    }

    #[test]
    fn outer_nfp_is_never_smaller_than_a() {
        let triangle = Polygon::new(vec![0.0, 0.0, 10.0, 0.0, 5.0, 8.0]);
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(0, 1, false, 1, 0),
            a: node(0, 90.0, triangle.clone()),
            b: node(1, 0.0, triangle),
        };
        let res = pair_nfp(&job);
        assert_eq!(res.loops.len(), 1);
        assert!(res.loops[0].area() < 0.0);
        assert!(res.loops[0].area().abs() >= 40.0);
    }

    #[test]
    fn hole_nfps_are_appended_when_enabled() {
        let frame = node(0, 0.0, Polygon::rectangle(0.0, 0.0, 30.0, 30.0));
        let mut frame = frame;
        let mut hole = PolygonNode::new(0, 0.0, Polygon::rectangle(5.0, 5.0, 20.0, 20.0));
        hole.polygon.reverse();
        frame.children.push(hole);
        let config = PackedConfig {
            use_holes: true,
            ..PackedConfig::default()
        };
        let job = PairJob {
            config,
            key: NfpKey::new(0, 1, false, 0, 0),
            a: frame,
            b: node(1, 0.0, Polygon::rectangle(0.0, 0.0, 5.0, 5.0)),
        };
        let res = pair_nfp(&job);
        assert_eq!(res.loops.len(), 2);
        assert!(res.loops[1].area() > 0.0);
        assert!(approx_eq!(f64, res.loops[1].area(), 225.0, epsilon = 1e-6));
    }
}
