//! No-fit polygons: the loci of a reference point of one polygon touching another.

pub mod geometry_util;
pub mod minkowski;
pub mod orbit;
pub mod pair;
pub mod rect;

#[doc(inline)]
pub use minkowski::{minkowski_difference, polygon_hull};
#[doc(inline)]
pub use orbit::no_fit_polygon;
#[doc(inline)]
pub use pair::{PairJob, PairResult, pair_nfp};
#[doc(inline)]
pub use rect::no_fit_polygon_rectangle;
