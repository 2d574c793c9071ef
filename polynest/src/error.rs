use thiserror::Error;

/// Errors raised by the geometry and nesting engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NestError {
    #[error("point pool exhausted: requested {requested} slots, {free} free")]
    PoolExhausted { requested: usize, free: usize },
    #[error("malformed wire buffer: {0}")]
    WireFormat(String),
    #[error("unknown job kind: {0}")]
    UnknownJobKind(u32),
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),
    #[error("offset produced {got} loops, expected {expected}")]
    OffsetLoopCount { expected: usize, got: usize },
    #[error("worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, NestError>;
