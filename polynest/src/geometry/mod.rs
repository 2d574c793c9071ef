pub mod bound_rect;
pub mod geo_traits;
pub mod point;
pub mod point_pool;
pub mod polygon;

#[doc(inline)]
pub use bound_rect::BoundRect;
#[doc(inline)]
pub use point::Point;
#[doc(inline)]
pub use point_pool::{PointPool, PoolLease};
#[doc(inline)]
pub use polygon::Polygon;
