use crate::geometry::BoundRect;

/// Trait for types that can be moved and turned in place.
pub trait Transformable {
    fn translate(&mut self, dx: f64, dy: f64) -> &mut Self;

    /// Rotates counter-clockwise around the origin by `degrees`.
    fn rotate(&mut self, degrees: f64) -> &mut Self;
}

/// Trait for shared properties of geometric primitives.
pub trait Shape {
    fn area(&self) -> f64;

    fn bound_rect(&self) -> BoundRect;
}
