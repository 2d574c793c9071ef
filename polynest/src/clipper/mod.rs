//! Vatti sweep boolean operations and path offsetting on an integer lattice.
//!
//! Float polygons are scaled onto the lattice with [`scale_up`] and brought back with [`scale_down`].
//! The helpers at the bottom of this module wrap the whole round trip.

mod edge;
mod engine;
mod int_point;
mod intersect;
mod join;
mod out_rec;
mod sweep;

pub mod clean;
pub mod offset;

#[doc(inline)]
pub use clean::{DEFAULT_CLEAN_DISTANCE, clean_path};
#[doc(inline)]
pub use engine::{ClipType, Clipper, PolyFillType, PolyType};
#[doc(inline)]
pub use int_point::{IntPath, IntPoint, area, orientation, point_in_path, round};
#[doc(inline)]
pub use offset::{ClipperOffset, JoinType};

use crate::geometry::Polygon;
use crate::geometry::geo_traits::Shape;

/// Lattice units per polygon unit used by the nesting engine
pub const CLIPPER_SCALE: f64 = 1e7;

pub fn scale_up(polygon: &Polygon, scale: f64) -> IntPath {
    polygon
        .points()
        .map(|p| IntPoint::new(round(p.0 * scale), round(p.1 * scale)))
        .collect()
}

pub fn scale_down(path: &[IntPoint], scale: f64) -> Polygon {
    let coords = path
        .iter()
        .flat_map(|p| [p.x as f64 / scale, p.y as f64 / scale])
        .collect();
    Polygon::new(coords)
}

/// Outer ring followed by the rings of every hole.
fn lattice_rings(polygon: &Polygon, scale: f64) -> Vec<IntPath> {
    std::iter::once(polygon)
        .chain(polygon.children.iter())
        .map(|p| scale_up(p, scale))
        .collect()
}

fn boolean(clip_type: ClipType, subject: &[Polygon], clips: &[Polygon], scale: f64) -> Vec<Polygon> {
    let mut clipper = Clipper::new();
    for p in subject {
        clipper.add_paths(&lattice_rings(p, scale), PolyType::Subject);
    }
    for p in clips {
        clipper.add_paths(&lattice_rings(p, scale), PolyType::Clip);
    }
    clipper
        .execute(clip_type, PolyFillType::NonZero, PolyFillType::NonZero)
        .iter()
        .map(|path| scale_down(path, scale))
        .collect()
}

/// Non-zero union of all polygons. Holes come back as separate rings of opposite winding.
pub fn union(polygons: &[Polygon], scale: f64) -> Vec<Polygon> {
    boolean(ClipType::Union, polygons, &[], scale)
}

pub fn difference(subject: &[Polygon], clips: &[Polygon], scale: f64) -> Vec<Polygon> {
    boolean(ClipType::Difference, subject, clips, scale)
}

pub fn intersection(subject: &[Polygon], clips: &[Polygon], scale: f64) -> Vec<Polygon> {
    boolean(ClipType::Intersection, subject, clips, scale)
}

/// Offsets the outer ring of `polygon` by `delta`. `arc_tolerance` is given in polygon units.
pub fn offset(
    polygon: &Polygon,
    delta: f64,
    join_type: JoinType,
    miter_limit: f64,
    arc_tolerance: f64,
    scale: f64,
) -> Vec<Polygon> {
    let mut co = ClipperOffset::new(miter_limit, arc_tolerance * scale);
    co.add_path(&scale_up(polygon, scale), join_type);
    co.execute(delta * scale)
        .iter()
        .map(|path| scale_down(path, scale))
        .collect()
}

/// Resolves self-intersections of a single ring into simple rings.
pub fn simplify(path: &[IntPoint]) -> Vec<IntPath> {
    let mut clipper = Clipper::new();
    clipper.add_path(path, PolyType::Subject);
    clipper.execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero)
}

/// Simplifies `polygon`, keeps its largest simple ring and strips vertices closer than `distance`.
/// Returns `None` when nothing with at least three vertices remains.
pub fn clean(polygon: &Polygon, distance: f64, scale: f64) -> Option<Polygon> {
    let simple = simplify(&scale_up(polygon, scale));
    let biggest = simple
        .iter()
        .max_by(|a, b| area(a).abs().total_cmp(&area(b).abs()))?;
    let cleaned = clean_path(biggest, distance * scale);
    match cleaned.is_empty() {
        true => None,
        false => {
            let p = scale_down(&cleaned, scale);
            (p.area().abs() > 0.0).then_some(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const SCALE: f64 = 1e7;

    fn total_area(polys: &[Polygon]) -> f64 {
        polys.iter().map(|p| p.area()).sum::<f64>().abs()
    }

    fn l_shape() -> Polygon {
        Polygon::new(vec![0.0, 0.0, 20.0, 0.0, 20.0, 5.0, 5.0, 5.0, 5.0, 15.0, 0.0, 15.0])
    }

    #[test]
    fn union_with_nothing_is_identity() {
        for p in [Polygon::rectangle(0.0, 0.0, 10.0, 7.0), l_shape()] {
            let u = union(&[p.clone()], SCALE);
            assert_eq!(u.len(), 1);
            assert!(approx_eq!(f64, total_area(&u), p.area().abs(), epsilon = 1e-6));
        }
    }

    #[test]
    fn difference_with_itself_is_empty() {
        for p in [Polygon::rectangle(0.0, 0.0, 10.0, 7.0), l_shape()] {
            assert!(difference(&[p.clone()], &[p], SCALE).is_empty());
        }
    }

    #[test]
    fn overlapping_squares() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(5.0, 5.0, 10.0, 10.0);
        assert!(approx_eq!(f64, total_area(&union(&[a.clone(), b.clone()], SCALE)), 175.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, total_area(&intersection(&[a.clone()], &[b.clone()], SCALE)), 25.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, total_area(&difference(&[a], &[b], SCALE)), 75.0, epsilon = 1e-6));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Polygon::rectangle(0.0, 0.0, 1.0, 1.0);
        let b = Polygon::rectangle(5.0, 5.0, 1.0, 1.0);
        assert!(intersection(&[a], &[b], SCALE).is_empty());
    }

    #[test]
    fn offset_round_trip_keeps_area() {
        let square = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let grown = offset(&square, 1.0, JoinType::Miter, 4.0, 0.3, SCALE);
        assert_eq!(grown.len(), 1);
        assert!(approx_eq!(f64, grown[0].area().abs(), 144.0, epsilon = 1e-6));
        let back = offset(&grown[0], -1.0, JoinType::Miter, 4.0, 0.3, SCALE);
        assert_eq!(back.len(), 1);
        assert!(approx_eq!(f64, back[0].area().abs(), 100.0, epsilon = 1e-6));
    }

    #[test]
    fn clean_drops_collinear_and_duplicate_vertices() {
        let noisy = Polygon::new(vec![0.0, 0.0, 5.0, 0.0, 10.0, 0.0, 10.0, 10.0, 10.0, 10.00001, 0.0, 10.0]);
        let cleaned = clean(&noisy, 0.3, SCALE).unwrap();
        assert_eq!(cleaned.len(), 4);
        assert!(approx_eq!(f64, cleaned.area().abs(), 100.0, epsilon = 1e-3));
    }
}
