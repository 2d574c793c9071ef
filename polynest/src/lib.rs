//! Polygon nesting engine: boolean and offset operations, no-fit polygons, their cache and
//! the binary formats used to hand work to parallel workers.

/// Vatti clipping and polygon offsetting on an integer lattice
pub mod clipper;

/// NFP cache keyed by part, rotation and containment
pub mod cache;

/// Part trees, placements and placement jobs
pub mod entities;

pub mod error;

/// Geometric primitives
pub mod geometry;

/// Importing instances, exporting solutions and the worker wire formats
pub mod io;

/// No-fit polygon construction
pub mod nfp;

/// Helper functions which do not belong to any specific module
pub mod util;
