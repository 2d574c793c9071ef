/// External (serializable) representations of instances and solutions
pub mod ext_repr;

/// Conversion of external instances into polygon trees
pub mod import;

/// Conversion of placement results into external solutions
pub mod export;

/// Binary formats exchanged with workers
pub mod wire;
