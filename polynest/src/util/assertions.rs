use log::error;

use crate::geometry::Polygon;
use crate::geometry::geo_traits::Shape;

//Consistency checks on engine state, used inside debug_assert!() blocks

pub fn polygon_is_finite(polygon: &Polygon) -> bool {
    polygon.coords().iter().all(|c| c.is_finite()) && polygon.children.iter().all(polygon_is_finite)
}

/// Every loop of an NFP has at least three vertices and finite coordinates.
pub fn nfp_loops_valid(loops: &[Polygon]) -> bool {
    for (i, l) in loops.iter().enumerate() {
        if l.len() < 3 || !polygon_is_finite(l) {
            error!("[NFP] loop {i} is degenerate: {} vertices", l.len());
            return false;
        }
    }
    true
}

/// An outer NFP always encloses the stationary polygon, so its primary loop cannot be smaller.
pub fn outer_nfp_encloses(primary: &Polygon, stationary: &Polygon) -> bool {
    primary.area().abs() >= stationary.area().abs()
}
