pub mod placement;
pub mod polygon_node;

#[doc(inline)]
pub use placement::{BinPlacement, Placement, PlacementJob, PlacementResult};
#[doc(inline)]
pub use polygon_node::{PolygonNode, offset_tree};
