//! Error types for matrix-mul operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("communication error: {0}")]
    Comm(#[from] grid_comm::Error),

    #[error("malformed message: {0}")]
    Payload(#[from] grid_types::PayloadMismatch),

    #[error("matrix dimension mismatch: A is {0}x{0}, B is {1}x{1}")]
    DimensionMismatch(usize, usize),

    #[error("buffer of {got} elements cannot hold a {n}x{n} matrix")]
    BufferSize { n: usize, got: usize },

    #[error("row {row} has {len} elements, expected {n}")]
    NotSquare { row: usize, len: usize, n: usize },

    #[error("matrix must have at least one row")]
    EmptyMatrix,

    #[error("at least one process is required")]
    NoProcesses,

    #[error("{procs} processes do not form a square grid (nearest is {grid}x{grid})")]
    NotPerfectSquare { procs: usize, grid: usize },

    #[error("coordinating rank was started without operands")]
    MissingOperands,

    #[error("received block of {got} elements, expected {expected}")]
    BlockSize { expected: usize, got: usize },

    #[error("shape message has {0} entries, expected 1")]
    MalformedShape(usize),

    #[error("coordinating rank produced no result")]
    MissingResult,
}
