//! Error types for isocrate

use thiserror::Error;

/// Main error type for isocrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{divisions} divisions do not evenly divide axis {axis} of extent {extent}")]
    InvalidDecomposition {
        axis: usize,
        extent: usize,
        divisions: usize,
    },

    #[error("Chunk {chunk:?} with offset {offset:?} does not fit grid of dimensions {dims:?}")]
    MalformedOffset {
        chunk: [usize; 3],
        offset: [usize; 3],
        dims: [usize; 3],
    },

    #[error("Malformed chunk result: {0}")]
    MalformedChunk(String),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for isocrate operations
pub type Result<T> = std::result::Result<T, Error>;
