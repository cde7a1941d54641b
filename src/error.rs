use std::io;
use thiserror::Error;

/// Errors surfaced while building a grid or resolving the run configuration.
///
/// All of these are fatal: the binary reports them on stderr and exits
/// with code 1. Nothing in the generation loop itself can fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grid dimensions must be positive, got {rows}x{cols}")]
    Dimensions { rows: usize, cols: usize },

    #[error("input grid is empty")]
    EmptyInput,

    #[error("row {row} has {got} columns, expected {expected} as in the first row")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error(
        "invalid character {byte:?} at row {row}, column {col}: \
         rows must contain only '0' and '1'"
    )]
    InvalidByte { row: usize, col: usize, byte: char },

    #[error("cannot allocate a {rows}x{cols} grid ({bytes} bytes per buffer); reduce the grid size")]
    Alloc {
        rows: usize,
        cols: usize,
        bytes: usize,
    },

    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
