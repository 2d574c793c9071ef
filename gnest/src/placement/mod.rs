mod solver;

#[doc(inline)]
pub use solver::place_parts;
